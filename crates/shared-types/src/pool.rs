//! # Data Pools
//!
//! In-memory caches for data received from the network or produced locally
//! while a block is built. Pools notify registered handlers when new data
//! lands; preprocessors use that to wake up waiters for missing items.
//!
//! Every store is bounded. Once full it refuses new keys with
//! [`PoolError::PoolFull`] until entries are removed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::constants::{DEFAULT_POOL_CAPACITY, METACHAIN_SHARD_ID};
use crate::entities::{Hash, Header, MiniBlock, ShardId, SmartContractResult, Transaction};
use crate::errors::PoolError;

/// Callback invoked with the key of newly added data.
pub type AddedHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Cache identifier for data flowing from `sender` to `receiver`.
///
/// `_S` when both are the same shard, `_S_R` otherwise.
pub fn shard_cacher_identifier(sender: ShardId, receiver: ShardId) -> String {
    if sender == receiver {
        return format!("_{}", shard_label(sender));
    }
    format!("_{}_{}", shard_label(sender), shard_label(receiver))
}

/// Text form of a shard id (`META` for the metachain).
pub fn shard_label(shard_id: ShardId) -> String {
    if shard_id == METACHAIN_SHARD_ID {
        return "META".to_string();
    }
    shard_id.to_string()
}

/// Hash keyed cache with add notifications.
pub struct HashCache<V> {
    entries: RwLock<HashMap<Hash, V>>,
    handlers: RwLock<Vec<AddedHandler>>,
    capacity: usize,
}

impl<V: Clone> HashCache<V> {
    /// Create an empty cache holding up to [`DEFAULT_POOL_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Create an empty cache holding up to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            handlers: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Insert a value. Returns `Ok(false)` if the key was already present.
    ///
    /// Handlers run after the lock is released so they may read the cache.
    pub fn put(&self, key: &[u8], value: V) -> Result<bool, PoolError> {
        {
            let mut entries = self.entries.write();
            if entries.contains_key(key) {
                return Ok(false);
            }
            if entries.len() >= self.capacity {
                return Err(PoolError::PoolFull {
                    capacity: self.capacity,
                });
            }
            entries.insert(key.to_vec(), value);
        }

        let handlers = self.handlers.read().clone();
        for handler in handlers {
            handler(key);
        }
        Ok(true)
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clone out a value.
    pub fn get(&self, key: &[u8]) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    /// Returns true if the key is cached.
    pub fn has(&self, key: &[u8]) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Remove a value.
    pub fn remove(&self, key: &[u8]) -> Option<V> {
        self.entries.write().remove(key)
    }

    /// All cached keys.
    pub fn keys(&self) -> Vec<Hash> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Register a callback for added keys.
    pub fn register_handler(&self, handler: AddedHandler) {
        self.handlers.write().push(handler);
    }
}

impl<V: Clone> Default for HashCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pool of caches partitioned by cache identifier (shard pair).
pub struct ShardedDataPool<V> {
    stores: RwLock<HashMap<String, Arc<HashCache<V>>>>,
    handlers: RwLock<Vec<AddedHandler>>,
    store_capacity: usize,
}

impl<V: Clone> ShardedDataPool<V> {
    /// Create an empty pool with [`DEFAULT_POOL_CAPACITY`] entries per store.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Create an empty pool with `store_capacity` entries per store.
    pub fn with_capacity(store_capacity: usize) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            handlers: RwLock::new(Vec::new()),
            store_capacity,
        }
    }

    /// Add a value to the store named `cache_id`, creating it on demand.
    /// Returns `Ok(false)` if the key was already there.
    pub fn add_data(&self, key: &[u8], value: V, cache_id: &str) -> Result<bool, PoolError> {
        let store = {
            let mut stores = self.stores.write();
            Arc::clone(
                stores
                    .entry(cache_id.to_string())
                    .or_insert_with(|| Arc::new(HashCache::with_capacity(self.store_capacity))),
            )
        };

        let added = store.put(key, value)?;
        if added {
            let handlers = self.handlers.read().clone();
            for handler in handlers {
                handler(key);
            }
        }
        Ok(added)
    }

    /// First value found under `key` in any store.
    pub fn search_first_data(&self, key: &[u8]) -> Option<V> {
        self.stores.read().values().find_map(|store| store.get(key))
    }

    /// The store for a cache id, if it exists.
    pub fn shard_data_store(&self, cache_id: &str) -> Option<Arc<HashCache<V>>> {
        self.stores.read().get(cache_id).cloned()
    }

    /// Remove a value from one store.
    pub fn remove_data(&self, key: &[u8], cache_id: &str) {
        if let Some(store) = self.shard_data_store(cache_id) {
            store.remove(key);
        }
    }

    /// Remove several values from one store.
    pub fn remove_set_of_data_from_pool(&self, keys: &[Hash], cache_id: &str) {
        if let Some(store) = self.shard_data_store(cache_id) {
            for key in keys {
                store.remove(key);
            }
        }
    }

    /// Remove a value from every store.
    pub fn remove_data_from_all_shards(&self, key: &[u8]) {
        for store in self.stores.read().values() {
            store.remove(key);
        }
    }

    /// Drop one store's content.
    pub fn clear_shard_store(&self, cache_id: &str) {
        if let Some(store) = self.shard_data_store(cache_id) {
            store.clear();
        }
    }

    /// Register a callback for keys added to any store.
    pub fn register_handler(&self, handler: AddedHandler) {
        self.handlers.write().push(handler);
    }
}

impl<V: Clone> Default for ShardedDataPool<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Index from `(shard, nonce)` to header hash.
#[derive(Default)]
pub struct NonceHashCache {
    entries: RwLock<HashMap<(ShardId, u64), Hash>>,
}

impl NonceHashCache {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the hash of the header at `nonce` for `shard_id`.
    pub fn put(&self, shard_id: ShardId, nonce: u64, hash: Hash) {
        self.entries.write().insert((shard_id, nonce), hash);
    }

    /// Header hash for `(shard_id, nonce)`.
    pub fn get(&self, shard_id: ShardId, nonce: u64) -> Option<Hash> {
        self.entries.read().get(&(shard_id, nonce)).cloned()
    }

    /// Forget an entry.
    pub fn remove(&self, shard_id: ShardId, nonce: u64) {
        self.entries.write().remove(&(shard_id, nonce));
    }
}

/// Every pool a node keeps, shared by the block processor and the
/// resolvers answering peer requests.
#[derive(Clone)]
pub struct DataPools {
    /// User transactions by shard pair.
    pub transactions: Arc<ShardedDataPool<Transaction>>,
    /// Smart contract results by shard pair.
    pub unsigned_transactions: Arc<ShardedDataPool<SmartContractResult>>,
    /// Mini-blocks by hash.
    pub mini_blocks: Arc<HashCache<MiniBlock>>,
    /// Shard headers by hash.
    pub headers: Arc<HashCache<Header>>,
    /// Metachain headers by hash.
    pub meta_blocks: Arc<HashCache<Header>>,
    /// Header hashes by shard and nonce.
    pub header_nonces: Arc<NonceHashCache>,
}

impl DataPools {
    /// Create empty pools with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Create empty pools whose stores hold up to `capacity` entries each.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transactions: Arc::new(ShardedDataPool::with_capacity(capacity)),
            unsigned_transactions: Arc::new(ShardedDataPool::with_capacity(capacity)),
            mini_blocks: Arc::new(HashCache::with_capacity(capacity)),
            headers: Arc::new(HashCache::with_capacity(capacity)),
            meta_blocks: Arc::new(HashCache::with_capacity(capacity)),
            header_nonces: Arc::new(NonceHashCache::new()),
        }
    }
}

impl Default for DataPools {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cacher_identifier() {
        assert_eq!(shard_cacher_identifier(1, 1), "_1");
        assert_eq!(shard_cacher_identifier(2, 0), "_2_0");
        assert_eq!(shard_cacher_identifier(0, METACHAIN_SHARD_ID), "_0_META");
    }

    #[test]
    fn test_hash_cache_put_is_idempotent() {
        let cache: HashCache<u32> = HashCache::new();
        assert_eq!(cache.put(b"a", 1), Ok(true));
        assert_eq!(cache.put(b"a", 2), Ok(false));
        assert_eq!(cache.get(b"a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sharded_pool_notifies_on_add_only() {
        let pool: ShardedDataPool<u32> = ShardedDataPool::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        pool.register_handler(Arc::new(move |_key| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(pool.add_data(b"x", 1, "_0_1"), Ok(true));
        assert_eq!(pool.add_data(b"x", 1, "_0_1"), Ok(false));
        assert_eq!(pool.add_data(b"y", 2, "_1"), Ok(true));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(pool.search_first_data(b"y"), Some(2));
        assert!(pool.shard_data_store("_0_1").is_some());
        assert!(pool.shard_data_store("_5").is_none());
    }

    #[test]
    fn test_sharded_pool_removal() {
        let pool: ShardedDataPool<u32> = ShardedDataPool::new();
        pool.add_data(b"x", 1, "_0").unwrap();
        pool.add_data(b"x", 1, "_0_1").unwrap();

        pool.remove_data(b"x", "_0");
        assert_eq!(pool.search_first_data(b"x"), Some(1));

        pool.remove_data_from_all_shards(b"x");
        assert_eq!(pool.search_first_data(b"x"), None);
    }

    #[test]
    fn test_hash_cache_refuses_new_keys_when_full() {
        let cache: HashCache<u32> = HashCache::with_capacity(2);
        cache.put(b"a", 1).unwrap();
        cache.put(b"b", 2).unwrap();

        assert_eq!(cache.put(b"c", 3), Err(PoolError::PoolFull { capacity: 2 }));
        // Known keys still answer as duplicates
        assert_eq!(cache.put(b"a", 9), Ok(false));
        assert_eq!(cache.len(), 2);

        cache.remove(b"a");
        assert_eq!(cache.put(b"c", 3), Ok(true));
    }

    #[test]
    fn test_sharded_pool_bounds_each_store() {
        let pool: ShardedDataPool<u32> = ShardedDataPool::with_capacity(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        pool.register_handler(Arc::new(move |_key| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        pool.add_data(b"x", 1, "_0").unwrap();
        assert_eq!(pool.add_data(b"y", 2, "_0"), Err(PoolError::PoolFull { capacity: 1 }));
        // Another shard pair has its own room
        assert_eq!(pool.add_data(b"y", 2, "_0_1"), Ok(true));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(pool.shard_data_store("_0").map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_data_pools_share_capacity() {
        let pools = DataPools::with_capacity(3);
        assert_eq!(pools.mini_blocks.capacity(), 3);
        assert_eq!(pools.headers.capacity(), 3);
        assert_eq!(DataPools::new().meta_blocks.capacity(), DEFAULT_POOL_CAPACITY);
    }

    #[test]
    fn test_nonce_hash_cache() {
        let cache = NonceHashCache::new();
        cache.put(0, 5, b"h5".to_vec());
        assert_eq!(cache.get(0, 5), Some(b"h5".to_vec()));
        assert_eq!(cache.get(1, 5), None);
        cache.remove(0, 5);
        assert_eq!(cache.get(0, 5), None);
    }
}
