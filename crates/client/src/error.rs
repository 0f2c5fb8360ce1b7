use morphgallery_transfer::TransferError;

/// Errors from the gallery client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid gallery URL: {0}")]
    InvalidUrl(String),
}

impl From<ClientError> for TransferError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(e) => TransferError::Network(e.to_string()),
            ClientError::Api { status, message } => TransferError::Rejected { status, message },
            ClientError::Json(e) => TransferError::Json(e),
            ClientError::Io(e) => TransferError::Io(e),
            ClientError::InvalidUrl(url) => TransferError::Network(format!("invalid URL: {url}")),
        }
    }
}
