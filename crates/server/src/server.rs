//! Gallery HTTP server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::config::ServerConfig;
use crate::routes::{AppState, create_router};

/// The gallery server.
pub struct GalleryServer {
    config: ServerConfig,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl GalleryServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until [`shutdown`](Self::shutdown) is called.
    ///
    /// Creates the upload directory if needed, then serves the router on
    /// the configured address.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        tokio::fs::create_dir_all(&self.config.upload_dir).await?;

        let addr = self.config.bind;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!(
            dir = %self.config.upload_dir.display(),
            max_upload_size = self.config.max_upload_size,
            "gallery server listening on {local_addr}"
        );

        let router = create_router(AppState::new(self.config.clone()));
        let cancel = self.cancel.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("server shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn wait_for_addr(server: &GalleryServer) -> SocketAddr {
        for _ in 0..200 {
            if let Some(addr) = server.local_addr().await {
                return addr;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("server did not bind");
    }

    #[tokio::test]
    async fn serves_listing_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let server = GalleryServer::new(ServerConfig {
            upload_dir: upload_dir.clone(),
            bind: "127.0.0.1:0".parse().unwrap(),
            ..ServerConfig::default()
        });

        let runner = Arc::clone(&server);
        let handle = tokio::spawn(async move { runner.run().await });
        let addr = wait_for_addr(&server).await;
        assert!(upload_dir.is_dir());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api HTTP/1.1\r\nHost: gallery.test\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.ends_with("[]"), "{response}");

        server.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_failure_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let server = GalleryServer::new(ServerConfig {
            upload_dir: dir.path().to_path_buf(),
            bind: taken.local_addr().unwrap(),
            ..ServerConfig::default()
        });

        let err = server.run().await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
