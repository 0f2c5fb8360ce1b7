use std::sync::Arc;

use morphgallery_viewer::CacheWarmer;
use tracing::debug;

use crate::cache::ImageCache;
use crate::client::fetch;

/// Preloads images into a [`GalleryClient`](crate::GalleryClient) cache.
///
/// Each warm spawns a detached GET on the current tokio runtime. Failures
/// are logged at debug level and otherwise ignored.
#[derive(Clone)]
pub struct HttpWarmer {
    http: reqwest::Client,
    cache: Arc<ImageCache>,
}

impl HttpWarmer {
    pub(crate) fn new(http: reqwest::Client, cache: Arc<ImageCache>) -> Self {
        Self { http, cache }
    }
}

impl CacheWarmer for HttpWarmer {
    fn warm(&self, url: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(url, "no runtime, skipping preload");
            return;
        };

        let http = self.http.clone();
        let cache = Arc::clone(&self.cache);
        let url = url.to_string();
        runtime.spawn(async move {
            if cache.contains(&url).await {
                return;
            }
            match fetch(&http, &url).await {
                Ok(body) => cache.insert(&url, body).await,
                Err(e) => debug!(url = %url, error = %e, "preload failed"),
            }
        });
    }

    fn is_cached(&self, url: &str) -> bool {
        // A busy cache reads as a miss; the spawned fetch checks again.
        self.cache.try_contains(url).unwrap_or(false)
    }
}
