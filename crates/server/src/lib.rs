//! HTTP server for a morphgallery image directory.
//!
//! Serves the JSON listing and multipart upload endpoint on `/api` and
//! the stored files under `/uploads`. Uploads are streamed to disk,
//! checked by content, and stored under a randomly prefixed name.

mod config;
mod error;
mod routes;
mod server;
mod storage;

pub use config::{ServerConfig, config_path};
pub use error::ServerError;
pub use routes::{AppState, base_url, create_router};
pub use server::GalleryServer;
pub use storage::{PendingFile, StoredFile, item_url, random_prefix, scan};
