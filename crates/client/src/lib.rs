//! HTTP client for a morphgallery server.
//!
//! [`GalleryClient`] is the transport behind the upload orchestrator
//! (it implements [`TransferClient`](morphgallery_upload::TransferClient))
//! and the image source of the viewer, whose neighbours are preloaded
//! through [`HttpWarmer`].

mod cache;
mod client;
mod config;
mod error;
mod warmer;

pub use cache::{DEFAULT_CACHE_CAPACITY, ImageCache};
pub use client::GalleryClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use warmer::HttpWarmer;
