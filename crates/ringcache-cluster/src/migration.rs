//! Key migration planning for topology changes.
//!
//! Plans are always computed against the ring *before* it changes:
//!
//! - **join**: every token the new node will claim splits the interval of
//!   the token after it. Only keys in `(predecessor, new_token]` move, and
//!   only from the node that currently answers for that interval.
//! - **leave**: every interval the departing node answers for is inherited
//!   by the node that reclaims its token or, failing that, by the next
//!   surviving owner clockwise. Its keys move there; with no surviving owner
//!   they are discarded.

use std::collections::BTreeMap;
use std::sync::Arc;

use ringcache_placement::{Ring, TokenHasher, TokenRange};
use ringcache_store::NodeStore;
use ringcache_types::NodeId;
use tracing::warn;

/// Per-node stores, keyed by node ID.
pub(crate) type StoreMap = BTreeMap<NodeId, Arc<dyn NodeStore>>;

/// A key that must move from one node's store to another's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMigration {
    /// The key that moves.
    pub key: String,
    /// The node whose store currently holds it.
    pub from: NodeId,
    /// The node that owns it after the change.
    pub to: NodeId,
}

/// Outcome of [`Directory::add_node`](crate::Directory::add_node) or
/// [`Directory::remove_node`](crate::Directory::remove_node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// The node that joined or left.
    pub node: NodeId,
    /// `false` if the edit was a no-op (node already present / absent).
    pub applied: bool,
    /// Keys moved between stores, sorted by key.
    pub moved: Vec<KeyMigration>,
    /// Keys dropped because the last node left, sorted.
    pub discarded: Vec<String>,
}

impl MigrationReport {
    pub(crate) fn noop(node: NodeId) -> Self {
        Self {
            node,
            applied: false,
            moved: Vec::new(),
            discarded: Vec::new(),
        }
    }
}

/// Moves computed for one topology change, not yet applied.
#[derive(Debug, Default)]
pub(crate) struct MigrationPlan {
    pub moves: Vec<KeyMigration>,
    pub discarded: Vec<String>,
}

/// Plan the moves for `joining` entering `ring`.
///
/// `ring` must not contain `joining` yet. An empty ring yields an empty plan.
pub(crate) fn plan_join<H: TokenHasher>(
    ring: &Ring<H>,
    stores: &StoreMap,
    joining: &NodeId,
) -> MigrationPlan {
    let mut plan = MigrationPlan::default();
    if ring.is_empty() {
        return plan;
    }

    // Group the split intervals by the node that answers for them today, so
    // each source store is scanned once.
    let mut splits: BTreeMap<&NodeId, Vec<TokenRange>> = BTreeMap::new();
    for token in ring.claimable_tokens(joining) {
        let (Some(previous), Some(next)) = (ring.predecessor(token), ring.successor(token)) else {
            continue;
        };
        let Some(owner) = ring.owner_of_token(next) else {
            continue;
        };
        splits
            .entry(owner)
            .or_default()
            .push(TokenRange::new(previous, token));
    }

    for (owner, ranges) in splits {
        let Some(store) = stores.get(owner) else {
            warn!(%owner, "ring owner has no store, skipping");
            continue;
        };
        for key in store.keys() {
            let position = ring.hash_key(&key);
            if ranges.iter().any(|range| range.contains(position)) {
                plan.moves.push(KeyMigration {
                    key,
                    from: owner.clone(),
                    to: joining.clone(),
                });
            }
        }
    }

    plan.moves.sort_by(|a, b| a.key.cmp(&b.key));
    plan
}

/// Plan the moves for `leaving` exiting `ring`.
///
/// Every key in the departing store is routed to the heir of the interval it
/// falls in. A key outside all of the node's intervals goes to its current
/// ring owner instead of being lost.
pub(crate) fn plan_leave<H: TokenHasher>(
    ring: &Ring<H>,
    stores: &StoreMap,
    leaving: &NodeId,
) -> MigrationPlan {
    let mut plan = MigrationPlan::default();
    let Some(store) = stores.get(leaving) else {
        return plan;
    };

    // A token another node also derives stays on the ring under that node;
    // every other interval falls to the next surviving owner clockwise.
    let owned = ring.owned_tokens(leaving);
    let reclaimers = ring.reclaimers(&owned, leaving);
    let heirs: Vec<(TokenRange, Option<&NodeId>)> = owned
        .into_iter()
        .filter_map(|token| {
            let range = ring.owned_range(token)?;
            let heir = reclaimers
                .get(&token)
                .or_else(|| ring.next_owner_excluding(token, leaving));
            Some((range, heir))
        })
        .collect();

    for key in store.keys() {
        let position = ring.hash_key(&key);
        let heir = match heirs.iter().find(|(range, _)| range.contains(position)) {
            Some((_, heir)) => heir.cloned(),
            None => ring
                .lookup_hash(position)
                .map(|(_, owner)| owner)
                .filter(|owner| *owner != leaving)
                .cloned(),
        };

        match heir {
            Some(to) => plan.moves.push(KeyMigration {
                key,
                from: leaving.clone(),
                to,
            }),
            None => plan.discarded.push(key),
        }
    }

    plan.moves.sort_by(|a, b| a.key.cmp(&b.key));
    plan.discarded.sort();
    plan
}

/// Execute planned moves: copy into the target, then delete from the source.
///
/// Returns the moves that were carried out. A key that disappeared from its
/// source since planning is skipped.
pub(crate) fn apply(moves: Vec<KeyMigration>, stores: &StoreMap) -> Vec<KeyMigration> {
    let mut applied = Vec::with_capacity(moves.len());
    for migration in moves {
        let (Some(source), Some(target)) = (stores.get(&migration.from), stores.get(&migration.to))
        else {
            warn!(
                key = %migration.key,
                from = %migration.from,
                to = %migration.to,
                "migration endpoint has no store, skipping"
            );
            continue;
        };
        let Some(value) = source.get(&migration.key) else {
            continue;
        };
        target.put(migration.key.clone(), value);
        source.delete(&migration.key);
        applied.push(migration);
    }
    applied
}

/// Keys whose owner differs between two [`snapshot_key_owners`] snapshots.
///
/// Keys missing from `after` count as changed. Keys only in `after` are
/// ignored.
///
/// [`snapshot_key_owners`]: crate::Directory::snapshot_key_owners
pub fn changed_owners<'a>(
    before: &'a BTreeMap<String, NodeId>,
    after: &BTreeMap<String, NodeId>,
) -> Vec<&'a str> {
    before
        .iter()
        .filter(|(key, owner)| after.get(*key) != Some(*owner))
        .map(|(key, _)| key.as_str())
        .collect()
}

/// Fraction of the keys in `before` whose owner changed. `0.0` if `before`
/// is empty.
pub fn moved_fraction(before: &BTreeMap<String, NodeId>, after: &BTreeMap<String, NodeId>) -> f64 {
    if before.is_empty() {
        return 0.0;
    }
    changed_owners(before, after).len() as f64 / before.len() as f64
}
