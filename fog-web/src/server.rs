//! HTTP server for media streaming and the JSON API
//!
//! Media routes carry their own origin handling so every response, error
//! or not, echoes the allowed origin. API routes use a `CorsLayer`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use fog_core::config::FogConfig;
use fog_core::storage::LocalStorage;
use fog_core::streaming::{HttpRemoteFetcher, RemoteFetcher, SourceResolver, StreamResponder};
use fog_core::{FogError, MediaCatalog};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cors::CorsPolicy;
use crate::handlers::{
    api_health, api_media, api_media_list, api_storage_info, download_media, stream_media,
    stream_preflight,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Frames media responses
    pub responder: Arc<StreamResponder>,
    /// Records listed by the API
    pub catalog: Arc<dyn MediaCatalog>,
    /// Local storage, scanned for the storage report
    pub storage: Arc<LocalStorage>,
    /// Origin policy for media responses and preflights
    pub cors: Arc<CorsPolicy>,
    /// Server start, reported as uptime
    pub started_at: Instant,
}

impl AppState {
    /// Wires state from configuration with an explicit remote fetcher.
    pub fn new(
        config: &FogConfig,
        catalog: Arc<dyn MediaCatalog>,
        fetcher: Arc<dyn RemoteFetcher>,
    ) -> Self {
        let storage = Arc::new(LocalStorage::from_config(&config.storage));
        let sources = SourceResolver::from_config(&config.storage, &config.remote);
        let responder = StreamResponder::new(catalog.clone(), storage.clone(), fetcher, sources);

        Self {
            responder: Arc::new(responder),
            catalog,
            storage,
            cors: Arc::new(CorsPolicy::from_config(&config.cors)),
            started_at: Instant::now(),
        }
    }

    /// Wires state with an HTTP fetcher for remote origins.
    ///
    /// # Errors
    ///
    /// - `FogError::Remote` - HTTP client could not be built
    pub fn from_config(config: &FogConfig, catalog: Arc<dyn MediaCatalog>) -> Result<Self, FogError> {
        let fetcher = HttpRemoteFetcher::new(&config.remote)?;
        Ok(Self::new(config, catalog, Arc::new(fetcher)))
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(api_health))
        .route("/media", get(api_media_list))
        .route("/media/{id}", get(api_media))
        .route("/storage/info", get(api_storage_info))
        .layer(state.cors.api_layer());

    Router::new()
        // Media endpoints
        .route(
            "/media/{id}/stream",
            get(stream_media).options(stream_preflight),
        )
        .route("/media/{id}/download", get(download_media))
        // JSON API endpoints
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the server until the listener fails.
///
/// # Errors
///
/// - Remote HTTP client setup failed
/// - Listener could not bind to the configured address
pub async fn run_server(
    config: FogConfig,
    catalog: Arc<dyn MediaCatalog>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_config(&config, catalog)?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "FOG media server running on http://{} (storage root {})",
        listener.local_addr()?,
        config.storage.root.display()
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use fog_core::InMemoryCatalog;
    use fog_core::streaming::test_fixtures::FakeRemoteFetcher;
    use tower::ServiceExt;

    use super::*;

    fn test_router() -> (tempfile::TempDir, Router) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = FogConfig::for_testing(temp_dir.path());
        let state = AppState::new(
            &config,
            Arc::new(InMemoryCatalog::new()),
            Arc::new(FakeRemoteFetcher::new()),
        );
        (temp_dir, build_router(state))
    }

    #[tokio::test]
    async fn test_preflight_for_allowed_origin() {
        let (_temp_dir, app) = test_router();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/media/42/stream")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, HEAD, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Range, Accept, Origin, Content-Type"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_temp_dir, app) = test_router();
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
