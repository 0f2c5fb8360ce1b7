use std::num::NonZeroUsize;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;

/// Number of image bodies kept by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// In-memory cache of fetched image bodies, keyed by URL.
///
/// Least recently used entries are evicted once `capacity` is reached;
/// a [`get`](Self::get) counts as a use.
#[derive(Debug)]
pub struct ImageCache {
    entries: Mutex<LruCache<String, Bytes>>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn get(&self, url: &str) -> Option<Bytes> {
        self.entries.lock().await.get(url).cloned()
    }

    /// Checks for `url` without refreshing its position.
    pub async fn contains(&self, url: &str) -> bool {
        self.entries.lock().await.contains(url)
    }

    /// Non-waiting [`contains`](Self::contains). `None` while the cache is
    /// locked elsewhere.
    pub fn try_contains(&self, url: &str) -> Option<bool> {
        self.entries.try_lock().ok().map(|entries| entries.contains(url))
    }

    pub async fn insert(&self, url: &str, body: Bytes) {
        self.entries.lock().await.put(url.to_string(), body);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
