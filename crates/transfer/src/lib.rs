//! Transfer bookkeeping for sequential multi-file uploads.
//!
//! A [`Batch`] owns one [`Transfer`] per submitted file and the byte
//! totals needed by [`ProgressAggregator`] to fold N independent
//! transfers into a single 0–100 percentage.

mod format;
mod progress;
mod types;
mod validation;

pub use format::format_size;
pub use progress::ProgressAggregator;
pub use types::{Batch, Transfer, TransferState};
pub use validation::{
    ValidationError, content_image_type, is_image_mime, path_image_type, sanitize_file_name,
    validate_image_type, validate_size,
};

/// Errors produced while moving one file to the gallery.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transfer ended before the server confirmed it")]
    Incomplete,
}

impl TransferError {
    /// Human-readable message suitable for a notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
