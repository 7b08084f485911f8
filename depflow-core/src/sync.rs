//! Shared Handles
//!
//! The schedulers are plain single-threaded data structures. When a host
//! drives one from several threads, every call has to be serialized; this
//! module provides the handle that does it.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// A cloneable, mutex-guarded handle to a value.
///
/// Clones share the same value. Each `with` call holds the lock for the
/// duration of the closure, so a `resolve` or `reject` always runs to
/// completion before another thread sees the state.
///
/// # Example
///
/// ```rust
/// use depflow_core::graph::DependencyResolver;
/// use depflow_core::map::InvertibleMap;
/// use depflow_core::sync::Shared;
///
/// let edges: InvertibleMap<_, _> = [(1, 2)].into_iter().collect();
/// let resolver = Shared::new(DependencyResolver::new(edges));
///
/// resolver.with(|r| r.fire([1]));
/// assert_eq!(resolver.with(|r| r.resolve([1])), vec![2]);
/// ```
#[derive(Debug, Default)]
pub struct Shared<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Lock the value. The lock is released when the guard drops.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    /// Take the value back if this is the last handle.
    pub fn try_unwrap(self) -> Result<T, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
