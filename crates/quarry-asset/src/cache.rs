//! Build-once asset cache

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Lookup counters for one cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub builds: u64,
}

/// Cache of built assets, keyed by identity.
///
/// A key is built at most once while its entry is alive: a hit hands out
/// another `Rc` to the stored value without running the builder. Entries are
/// only dropped by an explicit [`sweep`](Self::sweep) or [`clear`](Self::clear).
#[derive(Debug)]
pub struct AssetCache<K, V> {
    entries: HashMap<K, Rc<V>>,
    stats: CacheStats,
}

impl<K, V> Default for AssetCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<K: Eq + Hash, V> AssetCache<K, V> {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `key`, running `build` only on a miss.
    ///
    /// A failed build stores nothing, so the next lookup tries again.
    pub fn get_or_build<E, F>(&mut self, key: K, build: F) -> Result<Rc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(entry) = self.entries.get(&key) {
            self.stats.hits += 1;
            return Ok(Rc::clone(entry));
        }
        let value = Rc::new(build()?);
        self.stats.builds += 1;
        self.entries.insert(key, Rc::clone(&value));
        Ok(value)
    }

    /// Look up an entry, counting a hit if present
    pub fn get<Q>(&mut self, key: &Q) -> Option<Rc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let entry = self.entries.get(key).map(Rc::clone);
        if entry.is_some() {
            self.stats.hits += 1;
        }
        entry
    }

    /// Store a value built outside [`get_or_build`](Self::get_or_build)
    pub fn insert(&mut self, key: K, value: V) -> Rc<V> {
        let value = Rc::new(value);
        self.stats.builds += 1;
        self.entries.insert(key, Rc::clone(&value));
        value
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop entries nobody outside the cache still holds. Returns how many
    /// were released.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| Rc::strong_count(entry) > 1);
        let released = before - self.entries.len();
        if released > 0 {
            tracing::debug!(released, "swept cache");
        }
        released
    }

    /// Drop every entry and reset the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }
}
