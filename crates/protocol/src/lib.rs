//! Wire types for the gallery listing/upload API.
//!
//! Shared by the server that exposes the flat image directory and the
//! client that lists it and uploads into it.

pub mod constants;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{
    API_PATH, DEFAULT_MAX_UPLOAD_SIZE, IMAGE_EXTENSIONS, UPLOAD_FIELD, UPLOADS_PATH,
    has_image_extension,
};
pub use types::{ErrorResponse, GalleryItem, UploadResponse};
