use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Extension helpers for `DashMap` that avoid holding shard locks across `.await`.
///
/// Room records and welcome entries are read from async tasks that go on to
/// call the homeserver. `DashMap::get()` and `DashMap::iter()` return guards
/// holding a shard lock, so these helpers clone what they need and drop the
/// guard before the caller awaits anything.
pub trait DashMapExt<K, V> {
    /// Clone the value for `key` (dropping the DashMap guard immediately).
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone;

    /// Collect all keys by cloning them.
    fn keys_cloned(&self) -> Vec<K>
    where
        K: Clone;

    /// Collect the values matching `pred` by cloning them.
    fn filter_cloned<F>(&self, pred: F) -> Vec<V>
    where
        F: FnMut(&V) -> bool,
        V: Clone;
}

impl<K, V> DashMapExt<K, V> for DashMap<K, V>
where
    K: Eq + Hash,
{
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).map(|r| r.value().clone())
    }

    fn keys_cloned(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().map(|e| e.key().clone()).collect()
    }

    fn filter_cloned<F>(&self, mut pred: F) -> Vec<V>
    where
        F: FnMut(&V) -> bool,
        V: Clone,
    {
        self.iter()
            .filter(|e| pred(e.value()))
            .map(|e| e.value().clone())
            .collect()
    }
}
