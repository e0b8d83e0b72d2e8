//! Integration tests for the media stream and download endpoints
//!
//! Drives the full router in-process against temporary storage and a
//! scripted remote origin.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use fog_core::storage::test_fixtures::audio_bytes;

use crate::common::{
    ALLOWED_ORIGIN, PODCAST_LEN, body_bytes, body_json, header_str, podcast_server,
    podcast_server_with_chunk_size,
};

#[tokio::test]
async fn test_first_hundred_bytes_of_podcast() {
    let server = podcast_server();

    let response = server.stream(42, Some("bytes=0-99"), None).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 0-99/100000")
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("100"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("audio/mpeg"));
    assert_eq!(header_str(&response, header::CONTENT_DISPOSITION), Some("inline"));
    assert_eq!(body_bytes(response).await, audio_bytes(100));
}

#[tokio::test]
async fn test_full_stream_without_range() {
    let server = podcast_server_with_chunk_size(4096);

    let response = server.stream(42, None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("100000"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert!(header_str(&response, header::CONTENT_RANGE).is_none());
    assert_eq!(body_bytes(response).await, audio_bytes(PODCAST_LEN));
}

#[tokio::test]
async fn test_tail_and_suffix_ranges() {
    let server = podcast_server();
    let expected_tail = audio_bytes(PODCAST_LEN)[99_500..].to_vec();

    let response = server.stream(42, Some("bytes=99500-"), None).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 99500-99999/100000")
    );
    assert_eq!(body_bytes(response).await, expected_tail);

    let response = server.stream(42, Some("bytes=-500"), None).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 99500-99999/100000")
    );
    assert_eq!(body_bytes(response).await, expected_tail);
}

#[tokio::test]
async fn test_record_without_audio_is_not_found() {
    let server = podcast_server();

    let response = server.stream(43, None, None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Audio URL not available");
}

#[tokio::test]
async fn test_unknown_record_is_not_found() {
    let server = podcast_server();

    let response = server.stream(999, None, None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_forbidden_upstream_is_bad_gateway() {
    let server = podcast_server();

    let response = server.stream(44, None, None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        server.fetcher.requests(),
        vec!["https://drive.google.com/uc?export=download&id=forbidden".to_string()]
    );
    assert_eq!(server.play_count(44), 0);
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let server = podcast_server();

    let response = server.stream(49, None, None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_remote_source_is_proxied_in_full() {
    let server = podcast_server();

    let response = server.stream(46, Some("bytes=0-"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("none"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("5000"));
    assert!(header_str(&response, header::CONTENT_RANGE).is_none());
    assert_eq!(body_bytes(response).await, audio_bytes(5000));
    assert_eq!(server.play_count(46), 1);
}

#[tokio::test]
async fn test_malformed_range_serves_full_content() {
    let server = podcast_server();

    for range in ["bytes=abc", "bytes=0-10,20-30", "items=0-10", "bytes=-"] {
        let response = server.stream(42, Some(range), None).await;
        assert_eq!(response.status(), StatusCode::OK, "{range}");
        assert_eq!(
            header_str(&response, header::CONTENT_LENGTH),
            Some("100000"),
            "{range}"
        );
    }
}

#[tokio::test]
async fn test_unsatisfiable_ranges() {
    let server = podcast_server();

    for range in ["bytes=100000-", "bytes=0-100000", "bytes=200-100", "bytes=-0"] {
        let response = server.stream(42, Some(range), Some(ALLOWED_ORIGIN)).await;

        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "{range}"
        );
        assert_eq!(
            header_str(&response, header::CONTENT_RANGE),
            Some("bytes */100000")
        );
        assert_eq!(
            header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(ALLOWED_ORIGIN)
        );
        assert!(body_bytes(response).await.is_empty());
    }
    assert_eq!(server.play_count(42), 0);
}

#[tokio::test]
async fn test_repeated_range_requests_are_identical() {
    let server = podcast_server_with_chunk_size(1000);

    let first = server.stream(42, Some("bytes=12345-54321"), None).await;
    let second = server.stream(42, Some("bytes=12345-54321"), None).await;

    assert_eq!(first.status(), second.status());
    assert_eq!(
        header_str(&first, header::CONTENT_RANGE),
        header_str(&second, header::CONTENT_RANGE)
    );
    assert_eq!(
        header_str(&first, header::CONTENT_LENGTH),
        header_str(&second, header::CONTENT_LENGTH)
    );
    let first_body = body_bytes(first).await;
    assert_eq!(first_body.len(), 54321 - 12345 + 1);
    assert_eq!(first_body, body_bytes(second).await);
}

#[tokio::test]
async fn test_play_count_follows_playback_starts() {
    let server = podcast_server();

    server.stream(42, None, None).await;
    assert_eq!(server.play_count(42), 1);

    server.stream(42, Some("bytes=0-"), None).await;
    assert_eq!(server.play_count(42), 2);

    server.stream(42, Some("bytes=0-99"), None).await;
    assert_eq!(server.play_count(42), 3);

    // seeking mid-file
    server.stream(42, Some("bytes=50000-"), None).await;
    server.stream(42, Some("bytes=-1000"), None).await;
    assert_eq!(server.play_count(42), 3);

    server.get("/media/42/download").await;
    assert_eq!(server.play_count(42), 3);
}

#[tokio::test]
async fn test_head_request_does_not_count() {
    let server = podcast_server();

    let response = server
        .send(
            Request::builder()
                .method("HEAD")
                .uri("/media/42/stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("100000"));
    assert_eq!(server.play_count(42), 0);
}

#[tokio::test]
async fn test_missing_stored_file_is_not_found() {
    let server = podcast_server();

    let response = server.stream(45, None, None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(!body["detail"].as_str().unwrap().contains("lost.mp3"));
}

#[tokio::test]
async fn test_folder_link_is_bad_request() {
    let server = podcast_server();

    let response = server.stream(47, None, None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_content_type_from_extension() {
    let server = podcast_server();

    let response = server.stream(48, None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("audio/mp4"));
    assert_eq!(body_bytes(response).await.len(), 2048);
}

#[tokio::test]
async fn test_allowed_origin_copied_on_success_and_error() {
    let server = podcast_server();

    let response = server.stream(42, Some("bytes=0-9"), Some(ALLOWED_ORIGIN)).await;
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(ALLOWED_ORIGIN)
    );
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_EXPOSE_HEADERS),
        Some("Content-Range, Accept-Ranges, Content-Length")
    );

    let response = server.stream(43, None, Some(ALLOWED_ORIGIN)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(ALLOWED_ORIGIN)
    );
}

#[tokio::test]
async fn test_disallowed_origin_gets_no_cors_headers() {
    let server = podcast_server();

    let response = server
        .stream(42, Some("bytes=0-9"), Some("http://evil.example"))
        .await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert!(header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_preflight() {
    let server = podcast_server();

    let response = server
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/media/42/stream")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "range")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_METHODS),
        Some("GET, HEAD, OPTIONS")
    );
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_HEADERS),
        Some("Range, Accept, Origin, Content-Type")
    );
    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(ALLOWED_ORIGIN)
    );
    assert!(body_bytes(response).await.is_empty());
    assert_eq!(server.play_count(42), 0);
}

#[tokio::test]
async fn test_download_is_attachment_and_ignores_range() {
    let server = podcast_server();

    let response = server
        .send(
            Request::builder()
                .uri("/media/42/download")
                .header(header::RANGE, "bytes=100-199")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"podcast42.mp3\"")
    );
    assert_eq!(body_bytes(response).await.len(), PODCAST_LEN);
}

#[tokio::test]
async fn test_drive_download_named_after_file_id() {
    let server = podcast_server();

    let response = server.get("/media/46/download").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"shared.mp3\"")
    );
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("none"));
    assert_eq!(body_bytes(response).await, audio_bytes(5000));
    assert_eq!(server.play_count(46), 0);
}
