// Owned set and map containers for record fields.
//
// Both drop their contents recursively with the record that owns them, so
// there is no separate free step to get wrong.

use indexmap::IndexMap;
use std::hash::Hash;
use std::ops::Deref;

use crate::descriptor::TypeDescriptor;
use crate::error::Fault;
use crate::types::XenType;
use crate::value::Value;

/// Unordered collection, kept in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct XenSet<T>(Vec<T>);

impl<T> XenSet<T> {
    pub fn new() -> Self {
        XenSet(Vec::new())
    }

    /// `size` default-initialised elements.
    pub fn alloc(size: usize) -> Self
    where
        T: Default,
    {
        XenSet((0..size).map(|_| T::default()).collect())
    }

    pub fn push(&mut self, item: T) {
        self.0.push(item);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.0
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for XenSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for XenSet<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for XenSet<T> {
    fn from(items: Vec<T>) -> Self {
        XenSet(items)
    }
}

impl<T> FromIterator<T> for XenSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        XenSet(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for XenSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a XenSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: XenType> XenType for XenSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set_of(T::descriptor())
    }

    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(Fault::type_mismatch(Self::descriptor().to_string(), other.kind_name())),
        }
    }

    fn to_value(&self) -> Value {
        Value::Set(self.0.iter().map(XenType::to_value).collect())
    }
}

/// Insertion-ordered map with unique keys.
#[derive(Debug, Clone, PartialEq)]
pub struct XenMap<K: Hash + Eq, V>(IndexMap<K, V>);

impl<K: Hash + Eq, V> XenMap<K, V> {
    pub fn new() -> Self {
        XenMap(IndexMap::new())
    }

    /// Empty map with room for `size` entries.
    pub fn alloc(size: usize) -> Self {
        XenMap(IndexMap::with_capacity(size))
    }

    /// Returns the previous value when `key` was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.0.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.0.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.0.keys()
    }
}

impl<K: Hash + Eq, V> Default for XenMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for XenMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        XenMap(iter.into_iter().collect())
    }
}

impl<K: Hash + Eq, V> IntoIterator for XenMap<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: XenType + Hash + Eq, V: XenType> XenType for XenMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map_of(K::descriptor(), V::descriptor())
    }

    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Map(pairs) => {
                let mut map = XenMap::alloc(pairs.len());
                // Distinct wire keys ("1", "01") may decode to the same key.
                for (index, (k, v)) in pairs.into_iter().enumerate() {
                    if map.insert(K::from_value(k)?, V::from_value(v)?).is_some() {
                        return Err(Fault::type_mismatch(
                            format!("{} with unique keys", Self::descriptor()),
                            format!("duplicate key at entry {}", index),
                        ));
                    }
                }
                Ok(map)
            }
            other => Err(Fault::type_mismatch(Self::descriptor().to_string(), other.kind_name())),
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(self.0.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}
