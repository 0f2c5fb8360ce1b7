//! Gallery HTTP client.
//!
//! Async client using `reqwest`: lists the gallery, uploads files as
//! streamed multipart bodies with byte-level progress, and fetches
//! images through a small in-memory cache shared with [`HttpWarmer`].

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};
use morphgallery_protocol::{API_PATH, ErrorResponse, GalleryItem, UPLOAD_FIELD, UploadResponse};
use morphgallery_upload::{
    FileData, FileRef, ProgressReporter, TransferClient, TransferFuture, UploadReceipt,
};
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::cache::ImageCache;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::warmer::HttpWarmer;

/// Size of the chunks an upload body is streamed in.
const CHUNK_SIZE: usize = 64 * 1024;

type BodyStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

/// Client for one gallery server.
pub struct GalleryClient {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<ImageCache>,
}

impl GalleryClient {
    /// Creates a client for the gallery at `config.base_url`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|_| ClientError::InvalidUrl(config.base_url.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url,
            cache: Arc::new(ImageCache::default()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self) -> String {
        format!("{}{API_PATH}", self.base_url)
    }

    /// Lists the images currently stored, sorted by name.
    pub async fn list(&self) -> Result<Vec<GalleryItem>, ClientError> {
        let resp = self.http.get(self.api_url()).send().await?;
        let body = read_body(resp).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Uploads one file, reporting cumulative bytes streamed to `progress`.
    ///
    /// The full size is reported once the server confirmed the upload.
    pub async fn upload(
        &self,
        file: &FileRef,
        progress: ProgressReporter,
    ) -> Result<UploadResponse, ClientError> {
        let body = body_stream(&file.data).await?;
        let counted = count_progress(body, progress.clone());

        let mut part = Part::stream_with_length(reqwest::Body::wrap_stream(counted), file.size)
            .file_name(file.name.clone());
        if let Some(mime) = &file.mime {
            part = part.mime_str(mime)?;
        }
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!(file = %file.name, size = file.size, "uploading file");
        let resp = self.http.post(self.api_url()).multipart(form).send().await?;
        let status = resp.status().as_u16();
        let body = read_body(resp).await?;

        let uploaded: UploadResponse = serde_json::from_slice(&body)?;
        if !uploaded.success {
            return Err(ClientError::Api {
                status,
                message: "server did not confirm the upload".into(),
            });
        }

        progress.finish(file.size);
        Ok(uploaded)
    }

    /// Fetches an image body, serving it from the cache when warmed.
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes, ClientError> {
        if let Some(body) = self.cache.get(url).await {
            debug!(url, "image served from cache");
            return Ok(body);
        }
        let body = fetch(&self.http, url).await?;
        self.cache.insert(url, body.clone()).await;
        Ok(body)
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// A warmer that preloads into this client's cache.
    pub fn warmer(&self) -> HttpWarmer {
        HttpWarmer::new(self.http.clone(), Arc::clone(&self.cache))
    }
}

impl TransferClient for GalleryClient {
    fn send<'a>(&'a self, file: &'a FileRef, progress: ProgressReporter) -> TransferFuture<'a> {
        Box::pin(async move {
            self.upload(file, progress)
                .await
                .map(UploadReceipt::from)
                .map_err(|e| {
                    warn!(file = %file.name, error = %e, "upload request failed");
                    e.into()
                })
        })
    }
}

/// Performs a GET and returns the body of a successful response.
pub(crate) async fn fetch(http: &reqwest::Client, url: &str) -> Result<Bytes, ClientError> {
    let resp = http.get(url).send().await?;
    read_body(resp).await
}

/// Returns the body of a 2xx response, or the server's error message.
async fn read_body(resp: reqwest::Response) -> Result<Bytes, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp.bytes().await?)
}

async fn body_stream(data: &FileData) -> Result<BodyStream, ClientError> {
    match data {
        FileData::Path(path) => {
            let file = tokio::fs::File::open(path).await?;
            Ok(Box::pin(ReaderStream::with_capacity(file, CHUNK_SIZE)))
        }
        FileData::Bytes(bytes) => {
            let bytes = bytes.clone();
            let chunks: Vec<std::io::Result<Bytes>> = (0..bytes.len())
                .step_by(CHUNK_SIZE)
                .map(|start| Ok(bytes.slice(start..(start + CHUNK_SIZE).min(bytes.len()))))
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }
}

/// Reports the running total of bytes pulled from `body`.
fn count_progress(
    body: BodyStream,
    progress: ProgressReporter,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static {
    let mut sent = 0u64;
    body.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            progress.report(sent);
        }
        chunk
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphgallery_transfer::TransferError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    /// Reads one full HTTP request (headers and body).
    async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut data = Vec::new();
        let mut buf = vec![0u8; 8192];
        loop {
            let n = stream.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let Some(head_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&data[..head_end]).to_ascii_lowercase();
            let body = &data[head_end + 4..];
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok());

            let complete = match content_length {
                Some(len) => body.len() >= len,
                None if head.contains("transfer-encoding: chunked") => body.ends_with(b"0\r\n\r\n"),
                None => true,
            };
            if complete {
                break;
            }
        }
        data
    }

    /// Starts a mock HTTP server answering one request with `status` and
    /// `body`. The raw request is sent back through the returned receiver.
    async fn mock_server(status: u16, body: &str) -> (String, oneshot::Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                let resp = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
                let _ = tx.send(request);
            }
        });

        (url, rx)
    }

    fn client(url: &str) -> GalleryClient {
        GalleryClient::new(&ClientConfig::with_base_url(url)).unwrap()
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = GalleryClient::new(&ClientConfig::with_base_url("not a url")).err();
        assert!(matches!(err, Some(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let c = client("http://gallery.local/");
        assert_eq!(c.base_url(), "http://gallery.local");
        assert_eq!(c.api_url(), "http://gallery.local/api");
    }

    #[tokio::test]
    async fn list_returns_items() {
        let json = r#"[
            {"id":"a1_cat.png","name":"a1_cat.png","url":"http://h/uploads/a1_cat.png","size":10,"mime":"image/png"},
            {"id":"b2_dog.jpg","name":"b2_dog.jpg","url":"http://h/uploads/b2_dog.jpg","size":20,"mime":"image/jpeg"}
        ]"#;
        let (url, request) = mock_server(200, json).await;

        let items = client(&url).list().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].mime, "image/jpeg");

        let request = String::from_utf8(request.await.unwrap()).unwrap();
        assert!(request.starts_with("GET /api "), "{request}");
    }

    #[tokio::test]
    async fn list_surfaces_error_message() {
        let (url, _request) = mock_server(500, r#"{"error":"disk unavailable"}"#).await;

        let err = client(&url).list().await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "disk unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn upload_streams_and_reports_progress() {
        let json = r#"{"success":true,"id":"0a1b2c3d4e5f_cat.png","url":"http://h/uploads/0a1b2c3d4e5f_cat.png","size":200000}"#;
        let (url, request) = mock_server(200, json).await;

        let file = FileRef::from_bytes("cat.png", vec![7u8; 200_000]);
        let (reporter, progress_rx) = ProgressReporter::channel();
        let resp = client(&url).upload(&file, reporter).await.unwrap();
        assert_eq!(resp.id, "0a1b2c3d4e5f_cat.png");
        assert_eq!(*progress_rx.borrow(), 200_000);

        let request = String::from_utf8_lossy(&request.await.unwrap()).into_owned();
        assert!(request.starts_with("POST /api "));
        assert!(request.contains(r#"name="file""#));
        assert!(request.contains(r#"filename="cat.png""#));
        assert!(request.contains("image/png"));
    }

    #[tokio::test]
    async fn upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dog.jpg");
        std::fs::write(&path, vec![1u8; 5000]).unwrap();

        let json = r#"{"success":true,"id":"ffeeddccbbaa_dog.jpg","url":"http://h/uploads/ffeeddccbbaa_dog.jpg","size":5000}"#;
        let (url, _request) = mock_server(200, json).await;

        let file = FileRef::from_path(&path).unwrap();
        let (reporter, progress_rx) = ProgressReporter::channel();
        let receipt = client(&url).send(&file, reporter).await.unwrap();
        assert_eq!(receipt.size, 5000);
        assert_eq!(*progress_rx.borrow(), 5000);
    }

    #[tokio::test]
    async fn rejected_upload_maps_to_transfer_error() {
        let (url, _request) = mock_server(400, r#"{"error":"invalid file type: text/plain"}"#).await;

        let file = FileRef::from_bytes("notes.png", b"hello".to_vec());
        let (reporter, _progress_rx) = ProgressReporter::channel();
        let err = client(&url).send(&file, reporter).await.unwrap_err();
        match err {
            TransferError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid file type"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let file = FileRef::from_bytes("cat.png", vec![0u8; 10]);
        let (reporter, _rx) = ProgressReporter::channel();
        let err = client(&format!("http://127.0.0.1:{port}"))
            .send(&file, reporter)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Network(_)));
    }

    #[tokio::test]
    async fn fetch_image_uses_cache() {
        let (url, _request) = mock_server(200, "PNGDATA").await;
        let c = client(&url);
        let image_url = format!("{url}/uploads/cat.png");

        let first = c.fetch_image(&image_url).await.unwrap();
        assert_eq!(&first[..], b"PNGDATA");

        // The mock only answers once; a second network hit would fail.
        let second = c.fetch_image(&image_url).await.unwrap();
        assert_eq!(first, second);
    }
}
