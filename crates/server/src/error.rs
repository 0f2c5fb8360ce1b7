use std::net::SocketAddr;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use morphgallery_protocol::ErrorResponse;
use morphgallery_transfer::ValidationError;

/// Errors produced by the gallery server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("malformed upload: {0}")]
    Multipart(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unsupported method")]
    UnsupportedMethod,
}

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        Self::Multipart(e.body_text())
    }
}

impl From<MultipartRejection> for ServerError {
    fn from(e: MultipartRejection) -> Self {
        Self::Multipart(e.body_text())
    }
}

impl ServerError {
    /// Client-side problems are 400; everything else is the server's fault.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Multipart(_) | Self::UnsupportedMethod => {
                StatusCode::BAD_REQUEST
            }
            Self::Io(_) | Self::Bind { .. } | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
