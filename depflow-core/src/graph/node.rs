//! Graph Nodes
//!
//! This module defines what may be used as a node in the dependency graph
//! and the plain adjacency type the stack scheduler walks.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// Anything usable as a node identifier.
///
/// Implemented for every `Clone + Eq + Hash + Debug` type, so strings,
/// integers and small newtypes all qualify.
pub trait NodeKey: Clone + Eq + Hash + Debug {}

impl<T> NodeKey for T where T: Clone + Eq + Hash + Debug {}

/// Forward adjacency: each node maps to the nodes its edges point at.
///
/// Key order is insertion order, which fixes the order in which sibling
/// edges are walked.
pub type Adjacency<Id> = IndexMap<Id, IndexSet<Id>>;

/// Build an [`Adjacency`] from `(node, successors)` pairs.
///
/// Repeated nodes have their successor sets merged.
pub fn adjacency<Id, I, S>(entries: I) -> Adjacency<Id>
where
    Id: NodeKey,
    I: IntoIterator<Item = (Id, S)>,
    S: IntoIterator<Item = Id>,
{
    let mut edges = Adjacency::new();
    for (node, successors) in entries {
        edges
            .entry(node)
            .or_insert_with(IndexSet::new)
            .extend(successors);
    }
    edges
}
