/// Errors returned by viewer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerError {
    #[error("the gallery has no images")]
    NoItems,

    #[error("image index {index} out of range (gallery has {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("viewer is closed")]
    Closed,
}

/// An image that could not be fetched or decoded for display.
///
/// Never fatal: the viewer shows a failure placeholder in its place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load {url}: {reason}")]
pub struct DecodeError {
    pub url: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
