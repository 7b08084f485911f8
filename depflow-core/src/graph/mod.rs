//! Dependency Graph Scheduling
//!
//! This module implements the two schedulers that walk a dependency graph.
//!
//! # Overview
//!
//! - [`StackScheduler`] works on a plain forward [`Adjacency`] map. Firing a
//!   set of sources lays the reachable nodes out on a stack so that popping
//!   yields them in dependency order. Nodes can be blocked mid-traversal,
//!   which prunes everything only reachable through them.
//!
//! - [`DependencyResolver`] works on an [`InvertibleMap`](crate::map::InvertibleMap)
//!   so that inbound edges can be counted. It tracks which nodes are pending,
//!   hands out nodes whose dependencies have all resolved, and cascades
//!   rejection to nodes whose dependencies have all been rejected.
//!
//! # Design Decisions
//!
//! 1. Both schedulers own their edges. Callers read and mutate them through
//!    `edges()` / `edges_mut()`; nothing is copied.
//!
//! 2. Traversals use explicit work stacks instead of recursion, so deep
//!    graphs cannot overflow the call stack.
//!
//! 3. Neither scheduler is internally synchronized. Wrap one in
//!    [`Shared`](crate::sync::Shared) to drive it from several threads.

mod node;
mod resolver;
mod stack;

pub use node::{adjacency, Adjacency, NodeKey};
pub use resolver::DependencyResolver;
pub use stack::{Drain, StackScheduler};
