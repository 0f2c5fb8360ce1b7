//! HTTP routes: `GET /api` lists, `POST /api` uploads, `/uploads/*`
//! serves the stored files.

use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use morphgallery_protocol::{API_PATH, UPLOAD_FIELD, UPLOADS_PATH, UploadResponse};
use morphgallery_transfer::{ValidationError, sanitize_file_name};
use tower_http::services::ServeDir;
use tracing::info;

use crate::ServerError;
use crate::config::ServerConfig;
use crate::storage::{self, PendingFile};

/// State shared by the handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}

/// Creates the gallery router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = get(list_handler)
        .post(upload_handler)
        .fallback(unsupported_method)
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .route(API_PATH, api)
        .nest_service(UPLOADS_PATH, ServeDir::new(&state.config.upload_dir))
        .with_state(state)
}

/// Root URL clients should use to reach this server.
///
/// `public_url` wins when configured. Otherwise the scheme follows
/// `X-Forwarded-Proto` and the host comes from the `Host` header.
pub fn base_url(headers: &HeaderMap, public_url: Option<&str>) -> String {
    if let Some(url) = public_url {
        return url.trim_end_matches('/').to_string();
    }

    let https = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("https"));
    let scheme = if https { "https" } else { "http" };

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServerError> {
    let base = base_url(&headers, state.config.public_url.as_deref());
    let items = storage::scan(&state.config.upload_dir, &base).await?;
    Ok((
        [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
        Json(items),
    ))
}

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut multipart = multipart?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = sanitize_file_name(field.file_name().unwrap_or_default())?;

        let mut pending =
            PendingFile::create(&state.config.upload_dir, &name, state.config.max_upload_size)
                .await?;
        if let Err(e) = copy_field(&mut field, &mut pending).await {
            pending.discard().await;
            return Err(e);
        }
        let stored = pending.commit().await?;

        let base = base_url(&headers, state.config.public_url.as_deref());
        let url = storage::item_url(&base, &stored.id);
        info!(id = %stored.id, size = stored.size, mime = stored.mime, "upload stored");
        return Ok(Json(UploadResponse::ok(stored.id, url, stored.size)));
    }

    Err(ValidationError::MissingFile.into())
}

async fn copy_field(field: &mut Field<'_>, pending: &mut PendingFile) -> Result<(), ServerError> {
    while let Some(chunk) = field.chunk().await? {
        pending.write_chunk(&chunk).await?;
    }
    Ok(())
}

async fn unsupported_method() -> ServerError {
    ServerError::UnsupportedMethod
}
