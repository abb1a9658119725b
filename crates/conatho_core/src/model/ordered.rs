//! Keyed collection with a stable enumeration order.
//!
//! # Invariants
//! - `order` holds every key of `map` exactly once.
//! - Appends keep insertion order; `rebuild` takes the order of its input.

use std::collections::HashMap;
use std::hash::Hash;

/// Hash map paired with an ordered key list.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    map: HashMap<K, V>,
    order: Vec<K>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Hash, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all content; order follows `entries`. Later duplicates win
    /// but keep the position of the first occurrence.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        self.clear();
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    /// Inserts or replaces. New keys are appended to the order.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.map.insert(key, value);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.map.remove(key)?;
        self.order.retain(|candidate| candidate != key);
        Some(removed)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Keys in enumeration order.
    pub fn keys(&self) -> &[K] {
        &self.order
    }

    /// Values in enumeration order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.order.iter().filter_map(|key| self.map.get(key))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMap;

    #[test]
    fn insertion_order_survives_removal() {
        let mut map = OrderedMap::new();
        map.insert(3, "c");
        map.insert(1, "a");
        map.insert(2, "b");
        map.remove(&1);

        assert_eq!(map.keys(), &[3, 2]);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec!["c", "b"]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn replacing_a_value_keeps_its_position() {
        let mut map = OrderedMap::new();
        map.insert("x", 1);
        map.insert("y", 2);
        assert_eq!(map.insert("x", 10), Some(1));

        assert_eq!(map.keys(), &["x", "y"]);
        assert_eq!(map.get(&"x"), Some(&10));
    }

    #[test]
    fn rebuild_takes_input_order() {
        let mut map = OrderedMap::new();
        map.insert(1, ());
        map.rebuild([(9, ()), (4, ()), (7, ())]);

        assert_eq!(map.keys(), &[9, 4, 7]);
        assert!(!map.contains_key(&1));
    }
}
