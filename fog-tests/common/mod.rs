//! Shared harness for router-level tests
//!
//! Seeds a temporary storage root and an in-memory catalog with the podcast
//! records the scenarios refer to, and drives the router in-process.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use fog_core::config::FogConfig;
use fog_core::storage::test_fixtures::create_audio_fixture;
use fog_core::streaming::test_fixtures::FakeRemoteFetcher;
use fog_core::{InMemoryCatalog, MediaId, MediaResource};
use fog_web::{AppState, build_router};
use tempfile::TempDir;
use tower::ServiceExt;

/// Length of the main podcast fixture.
pub const PODCAST_LEN: usize = 100_000;

/// Origin the test configuration allows.
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Router plus handles on its collaborators.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub catalog: InMemoryCatalog,
    pub fetcher: FakeRemoteFetcher,
    pub router: Router,
}

impl TestServer {
    /// Current play count of a record.
    pub fn play_count(&self, id: u64) -> u64 {
        self.catalog
            .play_count(&MediaId::from(id))
            .expect("record exists")
    }

    /// Sends one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// GET `/media/{id}/stream` with optional Range and Origin headers.
    pub async fn stream(&self, id: u64, range: Option<&str>, origin: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(format!("/media/{id}/stream"));
        if let Some(range) = range {
            builder = builder.header(header::RANGE, range);
        }
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        self.send(builder.body(Body::empty()).expect("valid request"))
            .await
    }

    /// GET an arbitrary path.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
    }
}

/// Builds a server over the standard podcast fixtures.
///
/// | id | audio |
/// |----|-------|
/// | 42 | local `podcasts/audio/podcast42.mp3`, 100 000 bytes |
/// | 43 | none |
/// | 44 | Drive link whose origin answers 403 |
/// | 45 | local file that does not exist |
/// | 46 | Drive link whose origin streams 5 000 bytes |
/// | 47 | Drive folder link |
/// | 48 | local `podcasts/audio/sermon.m4a`, 2 048 bytes |
/// | 49 | plain URL whose origin refuses connections |
pub fn podcast_server() -> TestServer {
    podcast_server_with_chunk_size(8192)
}

/// Same as [`podcast_server`] with a custom streaming chunk size.
pub fn podcast_server_with_chunk_size(chunk_size: usize) -> TestServer {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    create_audio_fixture(temp_dir.path(), "podcasts/audio/podcast42.mp3", PODCAST_LEN);
    create_audio_fixture(temp_dir.path(), "podcasts/audio/sermon.m4a", 2048);

    let catalog = InMemoryCatalog::from_resources([
        MediaResource::new(
            42u64,
            "Sunday Service",
            Some("/storage/podcasts/audio/podcast42.mp3".to_string()),
        ),
        MediaResource::new(43u64, "Announcements", None),
        MediaResource::new(
            44u64,
            "Private Drive Episode",
            Some("https://drive.google.com/file/d/forbidden/view?usp=sharing".to_string()),
        ),
        MediaResource::new(45u64, "Lost Episode", Some("podcasts/audio/lost.mp3".to_string())),
        MediaResource::new(
            46u64,
            "Shared Drive Episode",
            Some("https://drive.google.com/open?id=shared".to_string()),
        ),
        MediaResource::new(
            47u64,
            "Folder Link",
            Some("https://drive.google.com/drive/folders/1WzmdDfCQt".to_string()),
        ),
        MediaResource::new(
            48u64,
            "Evening Sermon",
            Some("podcasts/audio/sermon.m4a".to_string()),
        ),
        MediaResource::new(
            49u64,
            "Offline Mirror",
            Some("https://cdn.example.org/ep49.ogg".to_string()),
        ),
    ]);

    let fetcher = FakeRemoteFetcher::new();
    fetcher
        .respond(
            "https://drive.google.com/uc?export=download&id=forbidden",
            403,
            b"Forbidden".to_vec(),
            64,
        )
        .respond(
            "https://drive.google.com/uc?export=download&id=shared",
            200,
            fog_core::storage::test_fixtures::audio_bytes(5000),
            1000,
        )
        .refuse("https://cdn.example.org/ep49.ogg");

    let mut config = FogConfig::for_testing(temp_dir.path());
    config.storage.chunk_size = chunk_size;
    let state = AppState::new(
        &config,
        Arc::new(catalog.clone()),
        Arc::new(fetcher.clone()),
    );

    TestServer {
        temp_dir,
        catalog,
        fetcher,
        router: build_router(state),
    }
}

/// Reads a whole response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects")
        .to_vec()
}

/// Reads a JSON response body.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON body")
}

/// Header value as a string slice.
pub fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}
