//! Dependency Resolver
//!
//! The resolver tracks which nodes of a live dependency graph are eligible to
//! run. It performs no work itself: the caller runs whatever a node stands
//! for and reports back with `resolve` or `reject`.
//!
//! # Edges
//!
//! The graph is an [`InvertibleMap`] where `from -> to` means `to` depends on
//! `from`. The reverse side gives every node's inbound edges, which is what
//! the counters below are measured against.
//!
//! # Algorithm
//!
//! - `fire` snapshots each node's inbound edge count as its dependency count
//!   and marks the sources pending.
//! - `resolve` takes a pending node out of the pending set and decrements the
//!   dependency count of each of its successors. A successor that reaches
//!   zero becomes pending and is returned to the caller.
//! - `reject` takes a node out of the pending set and bumps the rejected
//!   count of each successor. A successor whose inbound edges have all been
//!   rejected is rejected in turn, level by level.
//!
//! A node with some dependencies resolved and others rejected is never
//! returned by either call. It stays out of the pending set until the next
//! `fire`.
//!
//! # Frozen edges
//!
//! Counts are taken at `fire`. Edges added or removed during a cycle are only
//! partly seen: a successor with no snapshot falls back to its live inbound
//! count, but a node whose snapshot already includes an edge that is later
//! removed will never reach zero in that cycle.

use std::collections::{HashMap, HashSet};
use std::mem;

use indexmap::IndexSet;
use tracing::{debug, trace};

use super::node::NodeKey;
use crate::map::InvertibleMap;

/// Resolve/reject bookkeeping over an [`InvertibleMap`] of edges.
///
/// # Example
///
/// ```rust
/// use depflow_core::graph::DependencyResolver;
/// use depflow_core::map::InvertibleMap;
///
/// let edges: InvertibleMap<_, _> = [("a", "c"), ("b", "c")].into_iter().collect();
/// let mut resolver = DependencyResolver::new(edges);
///
/// resolver.fire(["a", "b"]);
/// assert!(resolver.resolve(["a"]).is_empty());
/// assert_eq!(resolver.resolve(["b"]), vec!["c"]);
/// ```
#[derive(Debug, Clone)]
pub struct DependencyResolver<Id> {
    edges: InvertibleMap<Id, Id>,

    /// Nodes awaiting a `resolve` or `reject` in the current cycle.
    pending: IndexSet<Id>,

    /// Unresolved inbound edges per node. Goes negative if a node is
    /// resolved into more times than it had edges at `fire`.
    dependency_counts: HashMap<Id, isize>,

    /// Inbound edges whose source was rejected.
    rejected_counts: HashMap<Id, usize>,
}

impl<Id: NodeKey> DependencyResolver<Id> {
    /// Create a resolver over `edges` with nothing pending.
    pub fn new(edges: InvertibleMap<Id, Id>) -> Self {
        let mut resolver = Self {
            edges,
            pending: IndexSet::new(),
            dependency_counts: HashMap::new(),
            rejected_counts: HashMap::new(),
        };
        resolver.reset_counts();
        resolver
    }

    pub fn edges(&self) -> &InvertibleMap<Id, Id> {
        &self.edges
    }

    /// Mutable access to the edges.
    ///
    /// See the module docs for how changes made during a cycle are seen.
    pub fn edges_mut(&mut self) -> &mut InvertibleMap<Id, Id> {
        &mut self.edges
    }

    pub fn into_edges(self) -> InvertibleMap<Id, Id> {
        self.edges
    }

    /// Start a new cycle with `sources` pending.
    pub fn fire<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = Id>,
    {
        self.reset_counts();
        self.pending.clear();
        self.pending.extend(sources);

        debug!(
            pending = self.pending.len(),
            tracked = self.dependency_counts.len(),
            "fired dependency resolver"
        );
    }

    /// Mark pending `ids` as done.
    ///
    /// Returns the nodes that became eligible as a result; they are pending
    /// from now on. Ids that are not pending are ignored.
    pub fn resolve<I>(&mut self, ids: I) -> Vec<Id>
    where
        I: IntoIterator<Item = Id>,
    {
        let mut ready = Vec::new();

        for id in ids {
            if !self.pending.shift_remove(&id) {
                trace!(node = ?id, "ignored resolve of non-pending node");
                continue;
            }
            trace!(node = ?id, "resolved node");

            let Some(successors) = self.edges.get(&id) else {
                continue;
            };
            for successor in successors {
                let remaining = match self.dependency_counts.get(successor) {
                    Some(count) => *count,
                    None => inbound_len(&self.edges, successor) as isize,
                } - 1;
                self.dependency_counts.insert(successor.clone(), remaining);

                if remaining <= 0 {
                    self.pending.insert(successor.clone());
                    ready.push(successor.clone());
                }
            }
        }

        ready
    }

    /// Mark `ids` as failed and cascade.
    ///
    /// Every id is dropped from the pending set whether or not it was there.
    /// Returns all rejected ids: `ids` first, then each cascade level in
    /// turn. A node is cascaded at most once per call.
    pub fn reject<I>(&mut self, ids: I) -> Vec<Id>
    where
        I: IntoIterator<Item = Id>,
    {
        let mut level: Vec<Id> = ids.into_iter().collect();
        let mut seen: HashSet<Id> = level.iter().cloned().collect();
        let mut rejected = Vec::with_capacity(level.len());

        while !level.is_empty() {
            let mut cascade = Vec::new();

            for id in &level {
                self.pending.shift_remove(id);

                let Some(successors) = self.edges.get(id) else {
                    continue;
                };
                for successor in successors {
                    let count = self.rejected_counts.entry(successor.clone()).or_insert(0);
                    *count += 1;

                    if *count >= inbound_len(&self.edges, successor)
                        && seen.insert(successor.clone())
                    {
                        cascade.push(successor.clone());
                    }
                }
            }

            trace!(level = ?level, cascaded = cascade.len(), "rejected nodes");
            rejected.extend(mem::replace(&mut level, cascade));
        }

        rejected
    }

    /// Forget the current cycle. Dependency counts are taken afresh.
    pub fn clear(&mut self) {
        self.reset_counts();
        self.pending.clear();
    }

    pub fn is_pending(&self, id: &Id) -> bool {
        self.pending.contains(id)
    }

    /// Pending nodes, in the order they became pending.
    ///
    /// Keeping that order makes taking a node out of the pending set linear
    /// in the number of pending nodes, so resolving a very wide frontier one
    /// node at a time is quadratic.
    pub fn pending(&self) -> indexmap::set::Iter<'_, Id> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Remaining unresolved inbound edges of `id`, if it is being tracked.
    pub fn dependency_count(&self, id: &Id) -> Option<isize> {
        self.dependency_counts.get(id).copied()
    }

    /// Inbound edges of `id` whose source was rejected this cycle.
    pub fn rejected_dependency_count(&self, id: &Id) -> usize {
        self.rejected_counts.get(id).copied().unwrap_or(0)
    }

    fn reset_counts(&mut self) {
        self.dependency_counts.clear();
        self.dependency_counts.extend(
            self.edges
                .iter_reverse()
                .map(|(id, sources)| (id.clone(), sources.len() as isize)),
        );
        self.rejected_counts.clear();
    }
}

fn inbound_len<Id: NodeKey>(edges: &InvertibleMap<Id, Id>, id: &Id) -> usize {
    edges.get_reverse(id).map_or(0, IndexSet::len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver<const N: usize>(
        pairs: [(&'static str, &'static str); N],
    ) -> DependencyResolver<&'static str> {
        DependencyResolver::new(pairs.into_iter().collect())
    }

    #[test]
    fn node_waits_for_every_dependency() {
        let mut resolver = resolver([("a", "c"), ("b", "c")]);
        resolver.fire(["a", "b"]);

        assert!(resolver.resolve(["a"]).is_empty());
        assert_eq!(resolver.dependency_count(&"c"), Some(1));
        assert_eq!(resolver.resolve(["b"]), vec!["c"]);
        assert!(resolver.is_pending(&"c"));
        assert_eq!(resolver.pending_len(), 1);
    }

    #[test]
    fn resolution_flows_down_a_chain() {
        let mut resolver = resolver([("a", "b"), ("b", "c")]);
        resolver.fire(["a"]);

        assert_eq!(resolver.resolve(["a"]), vec!["b"]);
        assert_eq!(resolver.resolve(["b"]), vec!["c"]);
        assert!(resolver.resolve(["c"]).is_empty());
        assert_eq!(resolver.pending_len(), 0);
    }

    #[test]
    fn resolving_non_pending_ids_is_ignored() {
        let mut resolver = resolver([("a", "b")]);
        resolver.fire(["a"]);

        assert!(resolver.resolve(["b", "unknown"]).is_empty());
        assert_eq!(resolver.dependency_count(&"b"), Some(1));

        assert_eq!(resolver.resolve(["a"]), vec!["b"]);
        assert!(resolver.resolve(["a"]).is_empty());
        assert_eq!(resolver.dependency_count(&"b"), Some(0));
    }

    #[test]
    fn single_rejection_does_not_cascade_into_shared_node() {
        let mut resolver = resolver([("a", "c"), ("b", "c")]);
        resolver.fire(["a", "b"]);

        assert_eq!(resolver.reject(["a"]), vec!["a"]);
        assert_eq!(resolver.rejected_dependency_count(&"c"), 1);
        assert_eq!(resolver.reject(["b"]), vec!["b", "c"]);
        assert!(!resolver.is_pending(&"a"));
        assert!(!resolver.is_pending(&"b"));
    }

    #[test]
    fn rejection_cascades_level_by_level() {
        let mut resolver = resolver([
            ("a", "b"),
            ("a", "c"),
            ("b", "d"),
            ("c", "d"),
            ("d", "e"),
        ]);
        resolver.fire(["a"]);

        assert_eq!(resolver.reject(["a"]), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn mixed_outcome_strands_node() {
        let mut resolver = resolver([("a", "c"), ("b", "c")]);
        resolver.fire(["a", "b"]);

        assert!(resolver.resolve(["a"]).is_empty());
        assert_eq!(resolver.reject(["b"]), vec!["b"]);
        assert!(!resolver.is_pending(&"c"));
        assert_eq!(resolver.pending_len(), 0);
    }

    #[test]
    fn reject_drops_non_pending_ids_too() {
        let mut resolver = resolver([("a", "b")]);
        resolver.fire(["a"]);

        assert_eq!(resolver.reject(["z"]), vec!["z"]);
        assert!(resolver.is_pending(&"a"));
    }

    #[test]
    fn reject_terminates_on_cycles() {
        let mut resolver = resolver([("a", "b"), ("b", "a")]);
        resolver.fire(["a"]);

        assert_eq!(resolver.reject(["a"]), vec!["a", "b"]);
    }

    #[test]
    fn fire_resets_previous_cycle() {
        let mut resolver = resolver([("a", "c"), ("b", "c")]);
        resolver.fire(["a", "b"]);
        resolver.resolve(["a"]);
        resolver.reject(["b"]);

        resolver.fire(["a", "b"]);
        assert_eq!(resolver.dependency_count(&"c"), Some(2));
        assert_eq!(resolver.rejected_dependency_count(&"c"), 0);
        assert_eq!(resolver.pending().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn pending_keeps_order_across_removals() {
        let mut resolver = resolver([("b", "x"), ("d", "y")]);
        resolver.fire(["a", "b", "c", "d", "e"]);

        assert_eq!(resolver.resolve(["b"]), vec!["x"]);
        resolver.reject(["a"]);
        assert_eq!(resolver.resolve(["d"]), vec!["y"]);

        assert_eq!(
            resolver.pending().copied().collect::<Vec<_>>(),
            vec!["c", "e", "x", "y"]
        );
    }

    #[test]
    fn clear_twice_matches_clear_once() {
        let mut resolver = resolver([("a", "b")]);
        resolver.fire(["a"]);

        resolver.clear();
        resolver.clear();

        assert_eq!(resolver.pending_len(), 0);
        assert_eq!(resolver.dependency_count(&"b"), Some(1));
        assert!(resolver.resolve(["a"]).is_empty());
    }

    #[test]
    fn late_successor_uses_live_inbound_count() {
        let mut resolver = resolver([("a", "b")]);
        resolver.fire(["a"]);

        resolver.edges_mut().add("a", ["late"]);
        assert_eq!(resolver.dependency_count(&"late"), None);

        assert_eq!(resolver.resolve(["a"]), vec!["b", "late"]);
    }

    #[test]
    fn edge_removed_mid_cycle_strands_dependent() {
        let mut resolver = resolver([("a", "c"), ("b", "c")]);
        resolver.fire(["a", "b"]);
        assert!(resolver.resolve(["a"]).is_empty());

        resolver.edges_mut().remove(&"b", ["c"]);

        assert!(resolver.resolve(["b"]).is_empty());
        assert!(!resolver.is_pending(&"c"));
        assert_eq!(resolver.dependency_count(&"c"), Some(1));
    }
}
