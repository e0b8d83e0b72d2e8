//! JSON API handlers for catalog and storage inspection

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use fog_core::MediaId;
use fog_core::catalog::MediaResource;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::server::AppState;

/// API error carrying the status and `{"detail": ...}` body.
pub type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, detail: &str) -> ApiError {
    (status, Json(json!({ "detail": detail })))
}

/// Catalog record as exposed to clients.
#[derive(Debug, Serialize)]
pub struct MediaSummary {
    /// Record id
    pub id: MediaId,
    /// Display title
    pub title: String,
    /// Whether an audio reference is recorded
    pub has_audio: bool,
    /// Playback starts so far
    pub play_count: u64,
    /// Inline playback endpoint
    pub stream_url: String,
    /// Attachment download endpoint
    pub download_url: String,
}

impl From<MediaResource> for MediaSummary {
    fn from(resource: MediaResource) -> Self {
        Self {
            stream_url: format!("/media/{}/stream", resource.id),
            download_url: format!("/media/{}/download", resource.id),
            has_audio: resource.audio_reference().is_some(),
            id: resource.id,
            title: resource.title,
            play_count: resource.play_count,
        }
    }
}

/// Liveness report with version and uptime.
pub async fn api_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Lists every record as `{"total", "media"}`.
///
/// # Errors
///
/// - 500 when the catalog cannot be listed
pub async fn api_media_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let resources = state.catalog.list().await.map_err(|e| {
        error!("Failed to list media: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    let media: Vec<MediaSummary> = resources.into_iter().map(MediaSummary::from).collect();
    Ok(Json(json!({
        "total": media.len(),
        "media": media,
    })))
}

/// Returns one record.
///
/// # Errors
///
/// - 404 `"Podcast not found"` for an unknown id
/// - 500 when the catalog lookup fails
pub async fn api_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaSummary>, ApiError> {
    let id = MediaId::new(id);
    match state.catalog.resolve(&id).await {
        Ok(Some(resource)) => Ok(Json(MediaSummary::from(resource))),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Podcast not found")),
        Err(e) => {
            error!("Failed to resolve media {}: {}", id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}

/// Totals the files under the storage root.
///
/// # Errors
///
/// - 500 when a storage directory cannot be read
pub async fn api_storage_info(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let info = state.storage.storage_info().await.map_err(|e| {
        error!("Failed to scan storage: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read storage")
    })?;

    Ok(Json(json!({
        "storage_path": info.storage_path,
        "total_files": info.total_files,
        "total_size_bytes": info.total_size_bytes,
        "total_size_mb": info.total_size_mb(),
        "scanned_at": info.scanned_at,
    })))
}
