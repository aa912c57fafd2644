use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Hit/miss counters for an [`EmbeddingCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe LRU cache for sentence and query embeddings
///
/// Answer sentences repeat across regeneration and repeated questions, so the
/// embedder checks here before calling the API. Memory stays bounded by the
/// LRU capacity.
pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// Create a new embedding cache holding at most `capacity` vectors
    /// (a capacity of 0 is treated as 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Entries are written whole, so a lock poisoned by a panicking caller
    /// still guards a consistent cache.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up the embedding for `text`, refreshing its LRU position.
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        let found = self.lock().get(text).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store an embedding, evicting the least recently used entry when full.
    pub fn put(&self, text: String, embedding: Vec<f32>) {
        self.lock().put(text, embedding);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_cache_put_and_get() {
        let cache = EmbeddingCache::new(10);
        cache.put("Article 5 sets out principles.".to_string(), vec![1.0, 2.0, 3.0]);

        assert_eq!(cache.get("Article 5 sets out principles."), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 0 });
    }

    #[test]
    fn test_cache_miss_is_counted() {
        let cache = EmbeddingCache::new(10);
        assert!(cache.get("never stored").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_cache_eviction_respects_recent_use() {
        let cache = EmbeddingCache::new(2);
        cache.put("s1".to_string(), vec![1.0]);
        cache.put("s2".to_string(), vec![2.0]);

        // Touch s1 so s2 becomes the eviction candidate
        let _ = cache.get("s1");
        cache.put("s3".to_string(), vec![3.0]);

        assert!(cache.get("s1").is_some());
        assert!(cache.get("s2").is_none());
        assert!(cache.get("s3").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_zero_capacity_holds_one() {
        let cache = EmbeddingCache::new(0);
        cache.put("a".to_string(), vec![1.0]);
        cache.put("b".to_string(), vec![2.0]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_cache_clear() {
        let cache = EmbeddingCache::new(4);
        cache.put("a".to_string(), vec![1.0]);
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_survives_poisoned_lock() {
        let cache = Arc::new(EmbeddingCache::new(4));
        cache.put("a".to_string(), vec![1.0]);
        let holder = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.cache.lock().unwrap();
            panic!("embedder died holding the cache");
        })
        .join();
        assert!(cache.cache.is_poisoned());

        assert_eq!(cache.get("a"), Some(vec![1.0]));
        cache.put("b".to_string(), vec![2.0]);
        assert_eq!(cache.len(), 2);
    }
}
