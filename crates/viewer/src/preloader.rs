use std::sync::Arc;

use morphgallery_protocol::GalleryItem;
use tracing::debug;

/// Fetches a resource into the transport cache without waiting for it.
///
/// Implementations must return immediately and swallow every failure.
pub trait CacheWarmer: Send + Sync {
    fn warm(&self, url: &str);

    /// Whether `url` currently sits in the transport cache.
    fn is_cached(&self, _url: &str) -> bool {
        false
    }
}

/// Warmer that does nothing, for hosts without a shared cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWarmer;

impl CacheWarmer for NoopWarmer {
    fn warm(&self, _url: &str) {}
}

/// Best-effort neighbour preloading.
///
/// Holds no state of its own: whether an image still needs fetching is
/// asked of the warmer, so entries evicted from the cache get warmed again.
pub struct Preloader {
    warmer: Arc<dyn CacheWarmer>,
}

impl Preloader {
    pub fn new(warmer: Arc<dyn CacheWarmer>) -> Self {
        Self { warmer }
    }

    /// Warms `items[index]`. No-op when out of range or already cached.
    ///
    /// Returns `true` if a fetch was issued.
    pub fn warm(&self, items: &[GalleryItem], index: usize) -> bool {
        let Some(item) = items.get(index) else {
            return false;
        };
        if self.warmer.is_cached(&item.url) {
            return false;
        }
        debug!(index, url = %item.url, "preloading image");
        self.warmer.warm(&item.url);
        true
    }

    /// Warms the images on both sides of `index`, wrapping around.
    pub fn warm_neighbors(&self, items: &[GalleryItem], index: usize) {
        let count = items.len();
        if count < 2 {
            return;
        }
        let next = (index + 1) % count;
        let prev = (index + count - 1) % count;
        self.warm(items, next);
        if prev != next {
            self.warm(items, prev);
        }
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.warmer.is_cached(url)
    }
}

impl Default for Preloader {
    fn default() -> Self {
        Self::new(Arc::new(NoopWarmer))
    }
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader").finish_non_exhaustive()
    }
}
