//! Ordered map with an undo log, backing the all-or-nothing farm operations.
//!
//! Between [`checkpoint`](JournaledMap::checkpoint) and
//! [`commit`](JournaledMap::commit) or [`rollback`](JournaledMap::rollback)
//! every write records the value it replaced. Rolling back replays that log in
//! reverse, so discarding an operation costs one step per entry it touched
//! rather than a copy of the whole map.

use std::collections::{btree_map, BTreeMap};

#[derive(Debug, Clone)]
pub struct JournaledMap<K, V> {
    entries: BTreeMap<K, V>,
    undo:    Vec<(K, Option<V>)>,
    open:    bool,
}

impl<K, V> Default for JournaledMap<K, V> {
    fn default() -> Self {
        Self { entries: BTreeMap::new(), undo: Vec::new(), open: false }
    }
}

impl<K: Ord + Clone, V: Clone> JournaledMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.entries.insert(key.clone(), value);
        self.record(key, previous.clone());
        previous
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let previous = self.entries.remove(key);
        if previous.is_some() {
            self.record(key.clone(), previous.clone());
        }
        previous
    }

    fn record(&mut self, key: K, previous: Option<V>) {
        if self.open {
            self.undo.push((key, previous));
        }
    }

    /// Start journaling. An unfinished journal is dropped, keeping its writes.
    pub fn checkpoint(&mut self) {
        self.undo.clear();
        self.open = true;
    }

    pub fn commit(&mut self) {
        self.undo.clear();
        self.open = false;
    }

    /// Undo every write since the last checkpoint, newest first.
    pub fn rollback(&mut self) {
        while let Some((key, previous)) = self.undo.pop() {
            match previous {
                Some(value) => self.entries.insert(key, value),
                None => self.entries.remove(&key),
            };
        }
        self.open = false;
    }

    #[cfg(test)]
    pub(crate) fn journal_len(&self) -> usize {
        self.undo.len()
    }
}

impl<K: Ord + Clone, V: Clone + Copy + Default> JournaledMap<K, V> {
    /// Value at `key`, or the default for a key never written.
    pub fn value(&self, key: &K) -> V {
        self.entries.get(key).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(n: u32) -> JournaledMap<u32, u64> {
        let mut map = JournaledMap::new();
        for k in 0..n {
            map.insert(k, k as u64 * 10);
        }
        map
    }

    #[test]
    fn writes_outside_a_checkpoint_are_not_journaled() {
        let map = seeded(1_000);
        assert_eq!(map.len(), 1_000);
        assert_eq!(map.journal_len(), 0);
    }

    #[test]
    fn rollback_restores_overwrites_and_drops_inserts() {
        let mut map = seeded(1_000);
        map.checkpoint();
        map.insert(3, 7);
        map.insert(3, 8);
        map.insert(5_000, 1);
        map.remove(&9);
        // the journal grows with the writes, not with the map
        assert_eq!(map.journal_len(), 4);

        map.rollback();
        assert_eq!(map.value(&3), 30);
        assert_eq!(map.value(&9), 90);
        assert!(!map.contains_key(&5_000));
        assert_eq!(map.len(), 1_000);
        assert_eq!(map.journal_len(), 0);
    }

    #[test]
    fn commit_keeps_writes_and_closes_the_journal() {
        let mut map = seeded(3);
        map.checkpoint();
        map.insert(1, 99);
        map.commit();
        map.rollback();
        assert_eq!(map.value(&1), 99);

        map.insert(2, 0);
        map.rollback();
        assert_eq!(map.value(&2), 0);
    }

    #[test]
    fn removing_a_missing_key_records_nothing() {
        let mut map = seeded(2);
        map.checkpoint();
        assert_eq!(map.remove(&42), None);
        assert_eq!(map.journal_len(), 0);
    }
}
