//! Stack Scheduler
//!
//! The stack scheduler linearizes the part of a graph reachable from a set of
//! fired nodes, and hands those nodes out one at a time so that a node comes
//! out only after every reached node with an edge into it.
//!
//! # Algorithm
//!
//! 1. `fire` walks the graph depth-first from each source. Every time a node
//!    is reached its visit count goes up by one; only the first visit expands
//!    its successors.
//! 2. Nodes are recorded when their expansion finishes (post-order), and the
//!    stack is laid out in that order. The top of the stack is therefore the
//!    last node to finish, i.e. a source.
//! 3. `pop` takes the top node and zeroes its count.
//! 4. `block` zeroes a node and walks its successors, decrementing each. A
//!    successor whose count falls to zero has lost every path that reached it
//!    and is unwound the same way. The stack is then rebuilt from whatever
//!    counts are still positive.
//!
//! # Frozen edges
//!
//! A cycle assumes the edges do not change between `fire` and the last `pop`.
//! A successor added to an already expanded node is never visited in the
//! current cycle and will not come out of the stack until the next `fire`.
//!
//! Fired sources are expected to be independent of each other. If one source
//! can reach another the stack is still consistent, but the reachable source
//! may come out before nodes that lead into it.

use std::collections::HashMap;

use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use super::node::{Adjacency, NodeKey};

/// Depth-first work stacks stay inline up to this depth.
const INLINE_DEPTH: usize = 16;

/// Topological stack over a forward adjacency map.
///
/// # Example
///
/// ```rust
/// use depflow_core::graph::{adjacency, StackScheduler};
///
/// let edges = adjacency([("a", vec!["b", "c"]), ("b", vec!["d"]), ("c", vec!["d"])]);
/// let mut scheduler = StackScheduler::new(edges);
///
/// scheduler.fire(["a"]);
/// let order: Vec<_> = scheduler.drain().collect();
/// assert_eq!(order, vec!["a", "c", "b", "d"]);
/// ```
#[derive(Debug, Clone)]
pub struct StackScheduler<Id> {
    /// Forward edges. Owned, but readable and writable by the caller.
    edges: Adjacency<Id>,

    /// How many times each node was reached in the current cycle.
    /// Key order is the post-order in which nodes finished expanding.
    visits: IndexMap<Id, usize>,

    /// Nodes still to hand out. The last element is the top.
    stack: Vec<Id>,

    /// The node most recently returned by `pop`.
    last_popped: Option<Id>,
}

impl<Id: NodeKey> StackScheduler<Id> {
    /// Create a scheduler over `edges`.
    pub fn new(edges: Adjacency<Id>) -> Self {
        Self {
            edges,
            visits: IndexMap::new(),
            stack: Vec::new(),
            last_popped: None,
        }
    }

    pub fn edges(&self) -> &Adjacency<Id> {
        &self.edges
    }

    /// Mutable access to the edges.
    ///
    /// Changes made during a cycle only take effect on the next `fire`.
    pub fn edges_mut(&mut self) -> &mut Adjacency<Id> {
        &mut self.edges
    }

    pub fn into_edges(self) -> Adjacency<Id> {
        self.edges
    }

    /// Start a new cycle rooted at `sources`.
    ///
    /// Discards all state from the previous cycle.
    pub fn fire<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = Id>,
    {
        self.visits.clear();
        self.last_popped = None;

        let mut fired = 0usize;
        for source in sources {
            self.visit(source);
            fired += 1;
        }
        self.rebuild();

        debug!(sources = fired, stacked = self.stack.len(), "fired stack scheduler");
    }

    /// Take the next node off the stack.
    ///
    /// Popping an empty stack also forgets the last popped node.
    pub fn pop(&mut self) -> Option<Id> {
        let Some(id) = self.stack.pop() else {
            self.last_popped = None;
            return None;
        };
        if let Some(count) = self.visits.get_mut(&id) {
            *count = 0;
        }
        trace!(node = ?id, remaining = self.stack.len(), "popped node");
        self.last_popped = Some(id.clone());
        Some(id)
    }

    /// Look at the next node without taking it.
    #[doc(alias = "seek")]
    pub fn peek(&self) -> Option<&Id> {
        self.stack.last()
    }

    /// Prune `ids` and every node that was only reached through them.
    ///
    /// An empty `ids` blocks the most recently popped node, if there is one.
    pub fn block<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = Id>,
    {
        let mut ids: SmallVec<[Id; 4]> = ids.into_iter().collect();
        if ids.is_empty() {
            match &self.last_popped {
                Some(last) => ids.push(last.clone()),
                None => return,
            }
        }

        for id in &ids {
            self.unvisit(id);
        }
        self.rebuild();

        debug!(blocked = ?ids, remaining = self.stack.len(), "blocked nodes");
    }

    /// Block the most recently popped node.
    pub fn block_last(&mut self) {
        self.block(std::iter::empty());
    }

    /// Drop all cycle state.
    pub fn clear(&mut self) {
        self.visits.clear();
        self.stack.clear();
        self.last_popped = None;
    }

    /// Pop nodes until the stack is exhausted.
    pub fn drain(&mut self) -> Drain<'_, Id> {
        Drain { scheduler: self }
    }

    /// Nodes still on the stack, bottom first.
    pub fn stack(&self) -> &[Id] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Current visit count of `id`. Unvisited and consumed nodes report 0.
    pub fn visit_count(&self, id: &Id) -> usize {
        self.visits.get(id).copied().unwrap_or(0)
    }

    pub fn last_popped(&self) -> Option<&Id> {
        self.last_popped.as_ref()
    }

    fn visit(&mut self, root: Id) {
        if let Some(count) = self.visits.get_mut(&root) {
            *count += 1;
            return;
        }

        // Nodes whose expansion has started but not finished, with the number
        // of times they were reached so far. A node is moved into `visits`
        // only when it finishes, which is what makes the order post-order.
        let mut open: HashMap<Id, usize> = HashMap::new();
        let mut frames: SmallVec<[(Id, usize); INLINE_DEPTH]> = smallvec![(root.clone(), 0)];
        open.insert(root, 1);

        while let Some((node, next)) = frames.last_mut() {
            let child = self
                .edges
                .get(&*node)
                .and_then(|successors| successors.get_index(*next))
                .cloned();

            match child {
                Some(child) => {
                    *next += 1;
                    if let Some(count) = self.visits.get_mut(&child) {
                        *count += 1;
                    } else if let Some(count) = open.get_mut(&child) {
                        // Back edge: count it, never re-expand
                        *count += 1;
                    } else {
                        open.insert(child.clone(), 1);
                        frames.push((child, 0));
                    }
                }
                None => {
                    if let Some((done, _)) = frames.pop() {
                        let count = open.remove(&done).unwrap_or(1);
                        self.visits.insert(done, count);
                    }
                }
            }
        }
    }

    fn unvisit(&mut self, id: &Id) {
        if let Some(count) = self.visits.get_mut(id) {
            *count = 0;
        }

        let mut unwinding: SmallVec<[Id; INLINE_DEPTH]> = smallvec![id.clone()];
        while let Some(node) = unwinding.pop() {
            let Some(successors) = self.edges.get(&node) else {
                continue;
            };
            for successor in successors {
                if let Some(count) = self.visits.get_mut(successor) {
                    if *count > 0 {
                        *count -= 1;
                        if *count == 0 {
                            unwinding.push(successor.clone());
                        }
                    }
                }
            }
        }
    }

    fn rebuild(&mut self) {
        self.stack.clear();
        self.stack.extend(
            self.visits
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(id, _)| id.clone()),
        );
    }
}

/// Iterator returned by [`StackScheduler::drain`].
///
/// Each step pops, so iterating consumes the stack.
pub struct Drain<'a, Id: NodeKey> {
    scheduler: &'a mut StackScheduler<Id>,
}

impl<Id: NodeKey> Iterator for Drain<'_, Id> {
    type Item = Id;

    fn next(&mut self) -> Option<Id> {
        self.scheduler.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.scheduler.len();
        (len, Some(len))
    }
}

impl<Id: NodeKey> ExactSizeIterator for Drain<'_, Id> {}
