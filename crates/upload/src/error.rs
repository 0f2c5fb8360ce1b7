//! Upload error types.

use morphgallery_transfer::TransferError;

/// Errors produced when submitting a batch.
///
/// Per-file transfer failures do not surface here: they are recorded in
/// the [`BatchReport`](crate::BatchReport) and the batch carries on.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no files selected")]
    EmptyBatch,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}
