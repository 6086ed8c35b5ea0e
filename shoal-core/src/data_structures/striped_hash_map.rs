use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::RwLock;

/// Bucket count used by [`StripedHashMap::new`]. Prime, so keys spread
/// reasonably even under simple hash functions.
pub const DEFAULT_BUCKET_COUNT: usize = 17;

///
/// Hash map with one reader-writer lock per bucket.
///
/// The bucket array is fixed at construction and never resized, so a key
/// maps to the same bucket for the life of the map and operations on
/// different buckets never contend. Lookups take a bucket's shared lock,
/// mutations its exclusive lock.
///
/// Entries within a bucket live in a plain vector; with a sane hasher and
/// enough buckets the chains stay short.
///
pub struct StripedHashMap<K, V, S = RandomState> {
    buckets: Vec<Bucket<K, V>>,
    hasher: S,
}

struct Bucket<K, V> {
    entries: RwLock<Vec<(K, V)>>,
}

impl<K, V> Bucket<K, V> {
    fn new() -> Self {
        Bucket {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<K, V> StripedHashMap<K, V, RandomState>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_COUNT)
    }

    /// # Panics
    /// Panics when `bucket_count` is zero.
    pub fn with_buckets(bucket_count: usize) -> Self {
        Self::with_buckets_and_hasher(bucket_count, RandomState::new())
    }
}

impl<K, V, S> StripedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// # Panics
    /// Panics when `bucket_count` is zero.
    pub fn with_buckets_and_hasher(bucket_count: usize, hasher: S) -> Self {
        assert!(bucket_count > 0, "bucket count must be positive");
        StripedHashMap {
            buckets: (0..bucket_count).map(|_| Bucket::new()).collect(),
            hasher,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Insert the pair, or overwrite the value if the key is present.
    pub fn add_or_update_value(&self, key: K, value: V) {
        let bucket = self.bucket_for(&key);
        let mut entries = bucket.entries.write().unwrap();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    /// Look the key up and clone its value, or hand back `default_value`.
    pub fn get_value(&self, key: &K, default_value: V) -> V
    where
        V: Clone,
    {
        self.find_and_apply(key, |value| value.clone())
            .unwrap_or(default_value)
    }

    /// Apply `f` to the value under the bucket's shared lock, without
    /// requiring the value to be cloneable.
    pub fn find_and_apply<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        let bucket = self.bucket_for(key);
        let entries = bucket.entries.read().unwrap();
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| f(v))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_and_apply(key, |_| ()).is_some()
    }

    /// Remove the key's entry. Returns whether anything was removed.
    pub fn remove_value(&self, key: &K) -> bool {
        let bucket = self.bucket_for(key);
        let mut entries = bucket.entries.write().unwrap();
        match entries.iter().position(|(k, _)| k == key) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copy the whole map out as one consistent state.
    ///
    /// Takes every bucket's shared lock in ascending index order before
    /// reading anything; all writers order bucket acquisition the same way
    /// (they only ever hold one), so the snapshot cannot deadlock and no
    /// write can interleave it.
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let guards: Vec<_> = self
            .buckets
            .iter()
            .map(|bucket| bucket.entries.read().unwrap())
            .collect();

        let mut entries = Vec::new();
        for guard in &guards {
            entries.extend(guard.iter().cloned());
        }
        entries
    }

    /// Total entry count, taking bucket locks one at a time: momentary,
    /// not a consistent cut.
    pub fn len(&self) -> usize {
        self.buckets
            .iter()
            .map(|bucket| bucket.entries.read().unwrap().len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets
            .iter()
            .all(|bucket| bucket.entries.read().unwrap().is_empty())
    }

    fn bucket_for(&self, key: &K) -> &Bucket<K, V> {
        let mut state = self.hasher.build_hasher();
        key.hash(&mut state);
        let index = (state.finish() as usize) % self.buckets.len();
        &self.buckets[index]
    }
}

impl<K, V> Default for StripedHashMap<K, V, RandomState>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}
