//! Integration test: hand-placed tokens and keys.
//!
//! With R=1 and fixed positions every expected owner can be read off the
//! circle: A at 10, B at 30, C at 25 and the key "k" at 20. D collides
//! with A at 10; the key "j" sits at 5.

use ringcache_cluster::{Directory, DirectoryError};
use ringcache_integration_tests::TableHasher;
use ringcache_types::NodeId;

fn directory() -> Directory<TableHasher> {
    let hasher = TableHasher::new(&[
        ("A#0", 10),
        ("B#0", 30),
        ("C#0", 25),
        ("D#0", 10),
        ("k", 20),
        ("j", 5),
    ]);
    Directory::with_hasher(1, hasher)
}

fn node(name: &str) -> NodeId {
    NodeId::from(name)
}

#[test]
fn test_sole_node_leaving_empties_directory() {
    let d = directory();
    d.add_node("B");
    assert_eq!(d.set("k", "v").unwrap(), node("B"));

    let report = d.remove_node("B");
    assert_eq!(report.discarded, vec!["k"]);
    assert!(report.moved.is_empty());
    assert_eq!(d.get("k"), Err(DirectoryError::EmptyRing));
    assert!(d.list_nodes().is_empty());
}

#[test]
fn test_leave_hands_key_to_next_node_clockwise() {
    let d = directory();
    d.add_node("A");
    d.add_node("B");
    assert_eq!(d.set("k", "v").unwrap(), node("B"));

    // B's interval (10, 30] wraps round to A at 10.
    d.remove_node("B");
    let (value, owner) = d.get("k").unwrap();
    assert_eq!(&value[..], b"v");
    assert_eq!(owner, node("A"));
}

#[test]
fn test_join_then_leave_follows_the_key() {
    let d = directory();
    d.add_node("A");
    d.add_node("B");
    d.set("k", "v").unwrap();

    let report = d.add_node("C");
    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.moved[0].key, "k");
    assert_eq!(report.moved[0].from, node("B"));
    assert_eq!(report.moved[0].to, node("C"));

    d.remove_node("B");
    let (value, owner) = d.get("k").unwrap();
    assert_eq!(&value[..], b"v");
    assert_eq!(owner, node("C"));
}

#[test]
fn test_colliding_token_stays_with_first_owner() {
    let d = directory();
    d.add_node("A");
    d.add_node("B");
    d.set("k", "v").unwrap();

    // D hashes onto A's token: A keeps it, D owns nothing.
    let report = d.add_node("D");
    assert!(report.applied);
    assert!(report.moved.is_empty());
    assert_eq!(d.ring().token_count(), 2);

    // Removing D must not remove A's token.
    let report = d.remove_node("D");
    assert!(report.moved.is_empty());
    d.remove_node("B");
    assert_eq!(d.lookup("k"), Some(node("A")));
    assert_eq!(d.get("k").unwrap().1, node("A"));
}

#[test]
fn test_collided_node_takes_over_token_when_owner_leaves() {
    let d = directory();
    d.add_node("A");
    d.add_node("D");
    assert_eq!(d.set("j", "v").unwrap(), node("A"));

    let report = d.remove_node("A");
    assert!(report.discarded.is_empty());
    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.moved[0].to, node("D"));

    let ring = d.ring();
    assert_eq!(ring.token_count(), 1);
    assert!(!ring.is_empty());
    let (value, owner) = d.get("j").unwrap();
    assert_eq!(&value[..], b"v");
    assert_eq!(owner, node("D"));

    // Same placement as a directory that only ever had D.
    let fresh = directory();
    fresh.add_node("D");
    assert_eq!(fresh.lookup("j"), d.lookup("j"));
    assert_eq!(
        fresh.ring().tokens().map(|(t, _)| t).collect::<Vec<_>>(),
        ring.tokens().map(|(t, _)| t).collect::<Vec<_>>()
    );
}
