//! Integration tests for the JSON API

use axum::body::Body;
use axum::http::{Request, StatusCode, header};

use crate::common::{ALLOWED_ORIGIN, PODCAST_LEN, body_json, header_str, podcast_server};

#[tokio::test]
async fn test_health() {
    let server = podcast_server();

    let response = server.get("/api/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_media_list() {
    let server = podcast_server();
    server.stream(42, None, None).await;

    let body = body_json(server.get("/api/media").await).await;

    assert_eq!(body["total"], 8);
    let media = body["media"].as_array().unwrap();
    let podcast = media.iter().find(|m| m["id"] == "42").unwrap();
    assert_eq!(podcast["title"], "Sunday Service");
    assert_eq!(podcast["play_count"], 1);
    assert_eq!(podcast["has_audio"], true);
    assert_eq!(podcast["stream_url"], "/media/42/stream");

    let silent = media.iter().find(|m| m["id"] == "43").unwrap();
    assert_eq!(silent["has_audio"], false);
}

#[tokio::test]
async fn test_single_media() {
    let server = podcast_server();

    let response = server.get("/api/media/48").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Evening Sermon");
    assert_eq!(body["download_url"], "/media/48/download");

    let response = server.get("/api/media/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "Podcast not found");
}

#[tokio::test]
async fn test_storage_info() {
    let server = podcast_server();

    let response = server.get("/api/storage/info").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_files"], 2);
    assert_eq!(body["total_size_bytes"], (PODCAST_LEN + 2048) as u64);
}

#[tokio::test]
async fn test_api_cors_layer() {
    let server = podcast_server();

    let response = server
        .send(
            Request::builder()
                .uri("/api/health")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(ALLOWED_ORIGIN)
    );

    let response = server
        .send(
            Request::builder()
                .uri("/api/health")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert!(header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
