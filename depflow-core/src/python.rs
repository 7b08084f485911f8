//! Python Bindings
//!
//! String-keyed wrappers around the core types. Edges are passed in as
//! lists of `(node, [successors])` pairs so their order survives the trip
//! from Python.

use pyo3::prelude::*;

use crate::graph::{adjacency, DependencyResolver, StackScheduler};
use crate::map::InvertibleMap;

type EdgeList = Vec<(String, Vec<String>)>;

fn to_map(edges: EdgeList) -> InvertibleMap<String, String> {
    let mut map = InvertibleMap::new();
    for (from, to) in edges {
        map.add(from, to);
    }
    map
}

/// Python-exposed InvertibleMap with `str` keys on both sides.
#[pyclass(name = "InvertibleMap")]
pub struct PyInvertibleMap {
    inner: InvertibleMap<String, String>,
}

#[pymethods]
impl PyInvertibleMap {
    #[new]
    #[pyo3(signature = (forward = None))]
    fn new(forward: Option<EdgeList>) -> Self {
        Self {
            inner: forward.map(to_map).unwrap_or_default(),
        }
    }

    fn add(&mut self, key: String, values: Vec<String>) {
        self.inner.add(key, values);
    }

    fn add_reverse(&mut self, value: String, keys: Vec<String>) {
        self.inner.add_reverse(value, keys);
    }

    fn remove(&mut self, key: String, values: Vec<String>) {
        self.inner.remove(&key, values);
    }

    fn remove_reverse(&mut self, value: String, keys: Vec<String>) {
        self.inner.remove_reverse(&value, keys);
    }

    /// Replace the values of `key`. Returns the map for chaining.
    fn set(mut slf: PyRefMut<'_, Self>, key: String, values: Vec<String>) -> PyRefMut<'_, Self> {
        slf.inner.set(key, values);
        slf
    }

    fn set_reverse(
        mut slf: PyRefMut<'_, Self>,
        value: String,
        keys: Vec<String>,
    ) -> PyRefMut<'_, Self> {
        slf.inner.set_reverse(value, keys);
        slf
    }

    #[pyo3(signature = (key, keep_key = false))]
    fn delete(&mut self, key: String, keep_key: bool) -> bool {
        self.inner.delete(&key, keep_key)
    }

    #[pyo3(signature = (value, keep_key = false))]
    fn delete_reverse(&mut self, value: String, keep_key: bool) -> bool {
        self.inner.delete_reverse(&value, keep_key)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn has(&self, key: String) -> bool {
        self.inner.contains_key(&key)
    }

    fn has_reverse(&self, value: String) -> bool {
        self.inner.contains_reverse_key(&value)
    }

    fn get(&self, key: String) -> Option<Vec<String>> {
        self.inner.get(&key).map(|values| values.iter().cloned().collect())
    }

    fn get_reverse(&self, value: String) -> Option<Vec<String>> {
        self.inner
            .get_reverse(&value)
            .map(|keys| keys.iter().cloned().collect())
    }

    /// Forward entries in insertion order.
    fn items(&self) -> EdgeList {
        self.inner
            .iter()
            .map(|(k, vs)| (k.clone(), vs.iter().cloned().collect()))
            .collect()
    }

    /// Reverse entries in insertion order.
    fn reverse_items(&self) -> EdgeList {
        self.inner
            .iter_reverse()
            .map(|(v, ks)| (v.clone(), ks.iter().cloned().collect()))
            .collect()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __contains__(&self, key: String) -> bool {
        self.inner.contains_key(&key)
    }

    fn __repr__(&self) -> String {
        format!(
            "InvertibleMap(keys={}, reverse_keys={})",
            self.inner.len(),
            self.inner.reverse_len()
        )
    }
}

/// Python-exposed StackScheduler. Iterating pops until empty.
#[pyclass(name = "StackScheduler")]
pub struct PyStackScheduler {
    inner: StackScheduler<String>,
}

#[pymethods]
impl PyStackScheduler {
    #[new]
    fn new(edges: EdgeList) -> Self {
        Self {
            inner: StackScheduler::new(adjacency(edges)),
        }
    }

    fn add_edge(&mut self, from: String, to: String) {
        self.inner.edges_mut().entry(from).or_default().insert(to);
    }

    fn fire(&mut self, sources: Vec<String>) {
        self.inner.fire(sources);
    }

    fn pop(&mut self) -> Option<String> {
        self.inner.pop()
    }

    fn seek(&self) -> Option<String> {
        self.inner.peek().cloned()
    }

    /// Block `ids`, or the last popped node when called without arguments.
    #[pyo3(signature = (ids = Vec::new()))]
    fn block(&mut self, ids: Vec<String>) {
        self.inner.block(ids);
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn stack(&self) -> Vec<String> {
        self.inner.stack().to_vec()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(&mut self) -> Option<String> {
        self.inner.pop()
    }
}

/// Python-exposed DependencyResolver.
#[pyclass(name = "DependencyResolver")]
pub struct PyDependencyResolver {
    inner: DependencyResolver<String>,
}

#[pymethods]
impl PyDependencyResolver {
    #[new]
    fn new(edges: EdgeList) -> Self {
        Self {
            inner: DependencyResolver::new(to_map(edges)),
        }
    }

    fn add_edge(&mut self, from: String, to: String) {
        self.inner.edges_mut().add(from, [to]);
    }

    fn fire(&mut self, sources: Vec<String>) {
        self.inner.fire(sources);
    }

    fn resolve(&mut self, ids: Vec<String>) -> Vec<String> {
        self.inner.resolve(ids)
    }

    fn reject(&mut self, ids: Vec<String>) -> Vec<String> {
        self.inner.reject(ids)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn is_pending(&self, id: String) -> bool {
        self.inner.is_pending(&id)
    }

    fn pending(&self) -> Vec<String> {
        self.inner.pending().cloned().collect()
    }
}
