//! Depflow Core
//!
//! This crate provides the data structures behind dependency-driven
//! scheduling. It implements:
//!
//! - An invertible one-to-many map that keeps forward and reverse edges in
//!   sync under every mutation
//! - A topological stack scheduler with mid-traversal pruning
//! - A dependency resolver that hands out nodes as their dependencies
//!   resolve, and cascades rejection when they fail
//! - An async driver that runs work for each node on tokio
//!
//! The crate is designed to be used both as a native Rust library and as a
//! Python extension module via PyO3 (feature `python`).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `map`: The invertible multimap
//! - `graph`: Node identity, the stack scheduler and the dependency resolver
//! - `driver`: Tokio executor feeding task outcomes back into a resolver
//! - `sync`: Mutex-guarded handles for multi-threaded hosts
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use depflow_core::graph::DependencyResolver;
//! use depflow_core::map::InvertibleMap;
//!
//! // "c" depends on both "a" and "b"
//! let mut edges = InvertibleMap::new();
//! edges.add("a", ["c"]);
//! edges.add("b", ["c"]);
//!
//! let mut resolver = DependencyResolver::new(edges);
//! resolver.fire(["a", "b"]);
//!
//! assert!(resolver.resolve(["a"]).is_empty());
//! assert_eq!(resolver.resolve(["b"]), vec!["c"]);
//! ```

pub mod driver;
pub mod error;
pub mod graph;
pub mod map;
pub mod sync;

#[cfg(feature = "python")]
mod python;

pub use driver::{drive, DriverConfig, Report};
pub use error::{DriverError, MapError};
pub use graph::{adjacency, Adjacency, DependencyResolver, NodeKey, StackScheduler};
pub use map::InvertibleMap;
pub use sync::Shared;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyInvertibleMap>()?;
    m.add_class::<python::PyStackScheduler>()?;
    m.add_class::<python::PyDependencyResolver>()?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
