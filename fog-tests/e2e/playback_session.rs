//! End-to-end playback session over real sockets
//!
//! Starts the media server and a stand-in remote origin on ephemeral ports,
//! then plays, seeks and proxies the way a browser audio element would.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use fog_core::config::FogConfig;
use fog_core::storage::test_fixtures::{audio_bytes, create_audio_fixture};
use fog_core::{InMemoryCatalog, MediaId, MediaResource};
use fog_web::{AppState, build_router};
use tokio::net::TcpListener;

const EPISODE_LEN: usize = 250_000;
const REMOTE_LEN: usize = 40_000;

/// Binds a router on an ephemeral port and returns its base URL.
async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn drive_origin(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match (params.get("export").map(String::as_str), params.get("id").map(String::as_str)) {
        (Some("download"), Some("episode")) => (StatusCode::OK, audio_bytes(REMOTE_LEN)),
        (Some("download"), Some(_)) => (StatusCode::FORBIDDEN, b"Forbidden".to_vec()),
        _ => (StatusCode::BAD_REQUEST, Vec::new()),
    }
}

struct Session {
    _temp_dir: tempfile::TempDir,
    catalog: InMemoryCatalog,
    base_url: String,
    client: reqwest::Client,
}

async fn start_session() -> Session {
    let origin_url = spawn(Router::new().route("/uc", get(drive_origin))).await;

    let temp_dir = tempfile::tempdir().unwrap();
    create_audio_fixture(temp_dir.path(), "podcasts/episode-7.mp3", EPISODE_LEN);

    let catalog = InMemoryCatalog::from_resources([
        MediaResource::new(
            7u64,
            "Episode 7",
            Some("/storage/podcasts/episode-7.mp3".to_string()),
        ),
        MediaResource::new(
            8u64,
            "Drive Episode",
            Some("https://drive.google.com/file/d/episode/view?usp=sharing".to_string()),
        ),
        MediaResource::new(
            9u64,
            "Restricted Drive Episode",
            Some("https://drive.google.com/file/d/restricted/view".to_string()),
        ),
        MediaResource::new(
            10u64,
            "Gone Mirror",
            Some("http://127.0.0.1:9/episode.ogg".to_string()),
        ),
    ]);

    let mut config = FogConfig::for_testing(temp_dir.path());
    config.storage.chunk_size = 16 * 1024;
    config.remote.drive_download_base = format!("{origin_url}/uc");

    let state = AppState::from_config(&config, Arc::new(catalog.clone())).unwrap();
    let base_url = spawn(build_router(state)).await;

    Session {
        _temp_dir: temp_dir,
        catalog,
        base_url,
        client: reqwest::Client::new(),
    }
}

impl Session {
    async fn get(&self, path: &str, range: Option<&str>) -> reqwest::Response {
        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Origin", "http://localhost:3000");
        if let Some(range) = range {
            request = request.header("Range", range);
        }
        request.send().await.unwrap()
    }

    fn play_count(&self, id: u64) -> u64 {
        self.catalog.play_count(&MediaId::from(id)).unwrap()
    }
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn test_play_seek_and_resume() {
    let session = start_session().await;
    let episode = audio_bytes(EPISODE_LEN);

    // Browser probes from the start
    let response = session.get("/media/7/stream", Some("bytes=0-")).await;
    assert_eq!(response.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header(&response, "content-range").as_deref(),
        Some("bytes 0-249999/250000")
    );
    assert_eq!(
        header(&response, "access-control-allow-origin").as_deref(),
        Some("http://localhost:3000")
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), episode.as_slice());
    assert_eq!(session.play_count(7), 1);

    // Listener scrubs forward
    let response = session
        .get("/media/7/stream", Some("bytes=125000-"))
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.bytes().await.unwrap().as_ref(),
        &episode[125_000..]
    );

    // ...and resumes near the end
    let response = session.get("/media/7/stream", Some("bytes=-4096")).await;
    assert_eq!(
        header(&response, "content-range").as_deref(),
        Some("bytes 245904-249999/250000")
    );
    assert_eq!(response.bytes().await.unwrap().len(), 4096);
    assert_eq!(session.play_count(7), 1);

    let response = session
        .get("/media/7/stream", Some("bytes=250000-"))
        .await;
    assert_eq!(
        response.status(),
        reqwest::StatusCode::RANGE_NOT_SATISFIABLE
    );
}

#[tokio::test]
async fn test_drive_episode_is_proxied() {
    let session = start_session().await;

    let response = session.get("/media/8/stream", None).await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(header(&response, "accept-ranges").as_deref(), Some("none"));
    assert_eq!(
        header(&response, "content-type").as_deref(),
        Some("audio/mpeg")
    );
    assert_eq!(
        response.bytes().await.unwrap().as_ref(),
        audio_bytes(REMOTE_LEN).as_slice()
    );
    assert_eq!(session.play_count(8), 1);
}

#[tokio::test]
async fn test_failing_origins_are_bad_gateway() {
    let session = start_session().await;

    let response = session.get("/media/9/stream", None).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Failed to stream audio");

    let response = session.get("/media/10/stream", None).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

    assert_eq!(session.play_count(9), 0);
    assert_eq!(session.play_count(10), 0);
}

#[tokio::test]
async fn test_download_saves_whole_episode() {
    let session = start_session().await;

    let response = session.get("/media/7/download", None).await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        header(&response, "content-disposition").as_deref(),
        Some("attachment; filename=\"episode-7.mp3\"")
    );
    assert_eq!(response.bytes().await.unwrap().len(), EPISODE_LEN);
    assert_eq!(session.play_count(7), 0);
}
