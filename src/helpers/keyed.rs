use crate::combiners::Count;
use crate::{PCollection, RFBound};
use std::hash::Hash;

impl<T: RFBound> PCollection<T> {
    /// Derive a key and produce (K, T)
    pub fn key_by<K, F>(self, key_fn: F) -> PCollection<(K, T)>
    where
        K: RFBound + Eq + Hash,
        F: 'static + Send + Sync + Fn(&T) -> K,
    {
        self.map(move |t| (key_fn(t), t.clone()))
    }
}

impl<T: RFBound + Eq + Hash> PCollection<T> {
    /// Number of occurrences of each distinct element: T -> (T, u64)
    pub fn count_per_element(self) -> PCollection<(T, u64)> {
        self.map(|t| (t.clone(), ())).combine_values(Count)
    }
}

impl<K: RFBound, V: RFBound> PCollection<(K, V)> {
    /// Transform the value, keep the key.
    pub fn map_values<O, F>(self, f: F) -> PCollection<(K, O)>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&V) -> O,
    {
        self.map(move |(k, v)| (k.clone(), f(v)))
    }

    pub fn keys(self) -> PCollection<K> {
        self.map(|(k, _)| k.clone())
    }

    pub fn values(self) -> PCollection<V> {
        self.map(|(_, v)| v.clone())
    }
}
