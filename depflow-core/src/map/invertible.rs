//! Invertible Map Implementation
//!
//! All mutation funnels through four direction-agnostic helpers (`link`,
//! `unlink`, `detach`, `derive_inverse`). Each public operation calls one of
//! them with `(forward, reverse)` or `(reverse, forward)`, so the "reverse"
//! methods are the same code with the two sides swapped.

use std::fmt::Debug;
use std::hash::Hash;
use std::mem;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MapError;

/// Forward iterator over `(key, values)` pairs, in key insertion order.
pub type Iter<'a, K, V> = indexmap::map::Iter<'a, K, IndexSet<V>>;

/// A one-to-many map that keeps its inverse up to date.
///
/// For every `k` and `v`: `v` is in `get(k)` if and only if `k` is in
/// `get_reverse(v)`.
///
/// # Example
///
/// ```rust
/// use depflow_core::map::InvertibleMap;
///
/// let mut edges = InvertibleMap::new();
/// edges.add("a", ["c"]);
/// edges.add("b", ["c"]);
///
/// let into_c = edges.get_reverse(&"c").unwrap();
/// assert!(into_c.contains(&"a") && into_c.contains(&"b"));
/// ```
#[derive(Clone)]
pub struct InvertibleMap<K, V> {
    forward: IndexMap<K, IndexSet<V>>,
    reverse: IndexMap<V, IndexSet<K>>,
}

impl<K, V> InvertibleMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            forward: IndexMap::new(),
            reverse: IndexMap::new(),
        }
    }

    /// Read-only view of the forward side.
    pub fn forward(&self) -> &IndexMap<K, IndexSet<V>> {
        &self.forward
    }

    /// Read-only view of the reverse side.
    pub fn reverse(&self) -> &IndexMap<V, IndexSet<K>> {
        &self.reverse
    }

    /// Number of keys on the forward side.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Number of keys on the reverse side.
    pub fn reverse_len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.reverse.is_empty()
    }

    /// Forward keys in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, K, IndexSet<V>> {
        self.forward.keys()
    }

    /// Reverse keys in insertion order.
    pub fn reverse_keys(&self) -> indexmap::map::Keys<'_, V, IndexSet<K>> {
        self.reverse.keys()
    }

    /// Iterate `(key, values)` over the forward side.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.forward.iter()
    }

    /// Iterate `(value, keys)` over the reverse side.
    pub fn iter_reverse(&self) -> Iter<'_, V, K> {
        self.reverse.iter()
    }

    /// Empty both sides.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}

impl<K, V> InvertibleMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    /// Seed from a forward map, deriving the reverse side.
    pub fn from_forward(forward: IndexMap<K, IndexSet<V>>) -> Self {
        let reverse = derive_inverse(&forward);
        Self { forward, reverse }
    }

    /// Seed from a reverse map, deriving the forward side.
    pub fn from_reverse(reverse: IndexMap<V, IndexSet<K>>) -> Self {
        let forward = derive_inverse(&reverse);
        Self { forward, reverse }
    }

    /// Seed from both sides without checking that they agree.
    ///
    /// Supplying sides that are not exact inverses leaves the map in a state
    /// where none of the other operations' guarantees hold. Use
    /// [`try_from_parts`](Self::try_from_parts) when the input is not trusted.
    pub fn from_parts(
        forward: IndexMap<K, IndexSet<V>>,
        reverse: IndexMap<V, IndexSet<K>>,
    ) -> Self {
        Self { forward, reverse }
    }

    /// Seed from both sides, rejecting them if they are not exact inverses.
    pub fn try_from_parts(
        forward: IndexMap<K, IndexSet<V>>,
        reverse: IndexMap<V, IndexSet<K>>,
    ) -> Result<Self, MapError>
    where
        K: Debug,
        V: Debug,
    {
        for (key, values) in &forward {
            for value in values {
                if !reverse.get(value).is_some_and(|keys| keys.contains(key)) {
                    return Err(MapError::MissingReverse {
                        key: format!("{key:?}"),
                        value: format!("{value:?}"),
                    });
                }
            }
        }
        for (value, keys) in &reverse {
            for key in keys {
                if !forward.get(key).is_some_and(|values| values.contains(value)) {
                    return Err(MapError::MissingForward {
                        key: format!("{key:?}"),
                        value: format!("{value:?}"),
                    });
                }
            }
        }
        Ok(Self { forward, reverse })
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.forward.contains_key(key)
    }

    pub fn contains_reverse_key(&self, value: &V) -> bool {
        self.reverse.contains_key(value)
    }

    /// Check for a single `key -> value` association.
    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.forward
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    /// Values associated with `key`, or `None` if the key has no entry.
    pub fn get(&self, key: &K) -> Option<&IndexSet<V>> {
        self.forward.get(key)
    }

    /// Keys associated with `value`, or `None` if the value has no entry.
    pub fn get_reverse(&self, value: &V) -> Option<&IndexSet<K>> {
        self.reverse.get(value)
    }

    /// Associate `key` with each of `values`.
    ///
    /// Values that are already associated are skipped.
    pub fn add<I>(&mut self, key: K, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        link(&mut self.forward, &mut self.reverse, key, values);
    }

    /// Associate reverse key `value` with each of `keys`.
    pub fn add_reverse<I>(&mut self, value: V, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        link(&mut self.reverse, &mut self.forward, value, keys);
    }

    /// Drop the association between `key` and each of `values`.
    ///
    /// Values that are not associated are ignored.
    pub fn remove<I>(&mut self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        unlink(&mut self.forward, &mut self.reverse, key, values);
    }

    /// Drop the association between reverse key `value` and each of `keys`.
    pub fn remove_reverse<I>(&mut self, value: &V, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        unlink(&mut self.reverse, &mut self.forward, value, keys);
    }

    /// Replace everything associated with `key` by `values`.
    ///
    /// An existing entry is emptied in place, so `set(k, [])` leaves `k`
    /// present with no values.
    pub fn set<I>(&mut self, key: K, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
    {
        detach(&mut self.forward, &mut self.reverse, &key, true);
        link(&mut self.forward, &mut self.reverse, key, values);
        self
    }

    /// Replace everything associated with reverse key `value` by `keys`.
    pub fn set_reverse<I>(&mut self, value: V, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
    {
        detach(&mut self.reverse, &mut self.forward, &value, true);
        link(&mut self.reverse, &mut self.forward, value, keys);
        self
    }

    /// Remove every association of `key`.
    ///
    /// With `keep_key` the entry stays behind with an empty set. Returns
    /// whether `key` had an entry.
    pub fn delete(&mut self, key: &K, keep_key: bool) -> bool {
        detach(&mut self.forward, &mut self.reverse, key, keep_key)
    }

    /// Remove every association of reverse key `value`.
    pub fn delete_reverse(&mut self, value: &V, keep_key: bool) -> bool {
        detach(&mut self.reverse, &mut self.forward, value, keep_key)
    }
}

fn link<A, B, I>(
    from: &mut IndexMap<A, IndexSet<B>>,
    to: &mut IndexMap<B, IndexSet<A>>,
    key: A,
    values: I,
) where
    A: Hash + Eq + Clone,
    B: Hash + Eq + Clone,
    I: IntoIterator<Item = B>,
{
    let mut values = values.into_iter().peekable();
    if values.peek().is_none() {
        return;
    }

    let set = from.entry(key.clone()).or_default();
    for value in values {
        if set.insert(value.clone()) {
            to.entry(value).or_default().insert(key.clone());
        }
    }
}

fn unlink<A, B, I>(
    from: &mut IndexMap<A, IndexSet<B>>,
    to: &mut IndexMap<B, IndexSet<A>>,
    key: &A,
    values: I,
) where
    A: Hash + Eq,
    B: Hash + Eq,
    I: IntoIterator<Item = B>,
{
    let Some(set) = from.get_mut(key) else {
        return;
    };
    for value in values {
        if set.shift_remove(&value) {
            if let Some(back) = to.get_mut(&value) {
                back.shift_remove(key);
            }
        }
    }
}

fn detach<A, B>(
    from: &mut IndexMap<A, IndexSet<B>>,
    to: &mut IndexMap<B, IndexSet<A>>,
    key: &A,
    keep_key: bool,
) -> bool
where
    A: Hash + Eq,
    B: Hash + Eq,
{
    let removed = if keep_key {
        from.get_mut(key).map(mem::take)
    } else {
        from.shift_remove(key)
    };
    let Some(values) = removed else {
        return false;
    };

    for value in &values {
        if let Some(back) = to.get_mut(value) {
            back.shift_remove(key);
        }
    }
    true
}

fn derive_inverse<A, B>(side: &IndexMap<A, IndexSet<B>>) -> IndexMap<B, IndexSet<A>>
where
    A: Hash + Eq + Clone,
    B: Hash + Eq + Clone,
{
    let mut inverse: IndexMap<B, IndexSet<A>> = IndexMap::new();
    for (key, values) in side {
        for value in values {
            inverse.entry(value.clone()).or_default().insert(key.clone());
        }
    }
    inverse
}

impl<K, V> Default for InvertibleMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// Equality compares the forward sides only; the reverse sides follow.
impl<K, V> PartialEq for InvertibleMap<K, V>
where
    K: Hash + Eq,
    V: Hash + Eq,
{
    fn eq(&self, other: &Self) -> bool {
        self.forward == other.forward
    }
}

impl<K: Hash + Eq, V: Hash + Eq> Eq for InvertibleMap<K, V> {}

impl<K: Debug, V: Debug> Debug for InvertibleMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertibleMap")
            .field("forward", &self.forward)
            .field("reverse", &self.reverse)
            .finish()
    }
}

impl<'a, K, V> IntoIterator for &'a InvertibleMap<K, V> {
    type Item = (&'a K, &'a IndexSet<V>);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Extend<(K, V)> for InvertibleMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, [value]);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for InvertibleMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

// ----------------------------------------------------------------------------
// Serde
// ----------------------------------------------------------------------------

// Only the forward side is written out; the reverse side is derived on load.

impl<K, V> Serialize for InvertibleMap<K, V>
where
    K: Serialize + Hash + Eq,
    V: Serialize + Hash + Eq,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.forward.serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for InvertibleMap<K, V>
where
    K: Deserialize<'de> + Hash + Eq + Clone,
    V: Deserialize<'de> + Hash + Eq + Clone,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::<K, IndexSet<V>>::deserialize(deserializer).map(Self::from_forward)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
