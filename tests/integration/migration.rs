//! Integration test: key migration on join and leave.
//!
//! Every membership edit must move exactly the keys whose owner changed,
//! and every stored key must sit on the node the ring names for it.

use std::collections::BTreeSet;

use ringcache_cluster::{Directory, changed_owners, moved_fraction};
use ringcache_integration_tests::{node_ids, reference_owner, seeded_directory};
use ringcache_types::NodeId;

fn assert_placement_consistent(directory: &Directory) {
    let ring = directory.ring();
    for (key, holder) in directory.snapshot_key_owners() {
        assert_eq!(
            reference_owner(&ring, &key).as_ref(),
            Some(&holder),
            "{key} stored on {holder} but owned elsewhere"
        );
    }
}

/// Adding one node to N moves only keys to the new node, and about 1/(N+1)
/// of them.
#[test]
#[ntest::timeout(60000)]
fn test_join_moves_exact_set_to_new_node() {
    let directory = seeded_directory(100, 9, 10_000);
    let before = directory.snapshot_key_owners();

    let report = directory.add_node("node-new");
    let after = directory.snapshot_key_owners();

    let changed: BTreeSet<&str> = changed_owners(&before, &after).into_iter().collect();
    let reported: BTreeSet<&str> = report.moved.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(changed, reported);
    assert!(report.moved.iter().all(|m| m.to == NodeId::from("node-new")));

    for key in &changed {
        assert_eq!(after[*key], NodeId::from("node-new"));
    }
    for (key, owner) in &after {
        if !changed.contains(key.as_str()) {
            assert_eq!(&before[key], owner, "{key} moved without being reported");
        }
    }

    let fraction = moved_fraction(&before, &after);
    assert!(
        (0.03..0.2).contains(&fraction),
        "expected roughly 10% of keys to move, got {fraction:.3}"
    );
    assert_placement_consistent(&directory);
}

/// Removing a node moves exactly its keys; nothing else changes owner.
#[test]
#[ntest::timeout(60000)]
fn test_leave_moves_exact_set_from_departing_node() {
    let directory = seeded_directory(100, 10, 10_000);
    let before = directory.snapshot_key_owners();
    let leaving = NodeId::from("node-7");

    let report = directory.remove_node(leaving.clone());
    let after = directory.snapshot_key_owners();

    let held: BTreeSet<&str> = before
        .iter()
        .filter(|(_, owner)| **owner == leaving)
        .map(|(key, _)| key.as_str())
        .collect();
    let changed: BTreeSet<&str> = changed_owners(&before, &after).into_iter().collect();
    assert_eq!(changed, held);
    assert!(report.discarded.is_empty());
    assert_eq!(after.len(), before.len());
    assert!(after.values().all(|owner| *owner != leaving));
    assert_placement_consistent(&directory);
}

/// A longer sequence of edits keeps placement consistent after every step.
#[test]
#[ntest::timeout(60000)]
fn test_placement_stays_consistent_across_edit_sequence() {
    let directory = seeded_directory(50, 4, 3_000);

    let joins = ["node-4", "node-5", "node-6"];
    let leaves = ["node-0", "node-5", "node-2"];
    for (join, leave) in joins.iter().zip(leaves) {
        let before = directory.snapshot_key_owners();
        let report = directory.add_node(*join);
        assert_eq!(
            report.moved.len(),
            changed_owners(&before, &directory.snapshot_key_owners()).len()
        );
        assert_placement_consistent(&directory);

        let before = directory.snapshot_key_owners();
        let report = directory.remove_node(leave);
        assert_eq!(
            report.moved.len(),
            changed_owners(&before, &directory.snapshot_key_owners()).len()
        );
        assert_placement_consistent(&directory);
    }

    assert_eq!(directory.snapshot_key_owners().len(), 3_000);
    assert_eq!(
        directory.list_nodes(),
        vec![
            NodeId::from("node-1"),
            NodeId::from("node-3"),
            NodeId::from("node-4"),
            NodeId::from("node-6")
        ]
    );
}

/// Growing from one node to many never loses a key.
#[test]
#[ntest::timeout(60000)]
fn test_scale_out_from_single_node() {
    let directory = seeded_directory(100, 1, 2_000);
    for node_id in node_ids(8).into_iter().skip(1) {
        let report = directory.add_node(node_id);
        assert!(report.applied);
        assert!(report.discarded.is_empty());
    }

    let counts = directory.key_counts();
    assert_eq!(counts.len(), 8);
    assert_eq!(counts.values().sum::<usize>(), 2_000);
    assert!(counts.values().all(|&count| count > 0));
    assert_placement_consistent(&directory);
}
