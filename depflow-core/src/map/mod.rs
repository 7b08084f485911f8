//! Invertible Maps
//!
//! This module implements the bidirectional one-to-many map that the
//! dependency schedulers are built on.
//!
//! # Overview
//!
//! An [`InvertibleMap<K, V>`] owns two multimaps:
//!
//! - `forward`: each `K` maps to a set of `V`
//! - `reverse`: each `V` maps to the set of `K` that point at it
//!
//! The two sides are always exact inverses of each other. Neither side is
//! ever handed out mutably; every mutation goes through a paired update that
//! touches both.
//!
//! # Design Decisions
//!
//! 1. Both sides are `IndexMap<_, IndexSet<_>>` so that key iteration follows
//!    insertion order and the order of values inside a set is stable.
//!
//! 2. Removing the last association of a key leaves an empty set behind
//!    rather than dropping the entry. "No entry" and "entry with no values"
//!    stay distinguishable through [`InvertibleMap::get`].

mod invertible;

pub use invertible::{InvertibleMap, Iter};
