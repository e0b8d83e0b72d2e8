//! Media stream, download and preflight handlers

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, Response, StatusCode};
use fog_core::streaming::{StreamRequest, apply_allowed_origin};
use tracing::debug;

use super::range::{error_response, extract_header, extract_range_header, into_http_response};
use crate::cors::{PREFLIGHT_HEADERS, PREFLIGHT_METHODS};
use crate::server::AppState;

/// Range-aware playback endpoint.
///
/// HEAD requests are answered by axum from this handler with the body
/// dropped; they never count as a playback.
pub async fn stream_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Response<Body> {
    let mut request = build_request(&state, id, &headers);
    if method == Method::HEAD {
        request = request.without_playback();
    }
    respond(&state, request).await
}

/// Full-file download endpoint; never counts as a playback.
pub async fn download_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response<Body> {
    let mut request = build_request(&state, id, &headers).as_download();
    request.range = None;
    respond(&state, request).await
}

/// CORS preflight for the stream endpoint.
pub async fn stream_preflight(State(state): State<AppState>, headers: HeaderMap) -> Response<Body> {
    let origin = extract_header(&headers, header::ORIGIN);
    let allowed_origin = state.cors.allowed_origin(origin.as_deref());
    debug!("Preflight from {:?}, allowed: {:?}", origin, allowed_origin);

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let response_headers = response.headers_mut();
    response_headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_METHODS),
    );
    response_headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(PREFLIGHT_HEADERS),
    );
    response_headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(state.cors.max_age().as_secs()),
    );
    apply_allowed_origin(response_headers, allowed_origin.as_deref());

    response
}

fn build_request(state: &AppState, id: String, headers: &HeaderMap) -> StreamRequest {
    let origin = extract_header(headers, header::ORIGIN);
    let mut request = StreamRequest::new(id);
    request.range = extract_range_header(headers);
    request.accept = extract_header(headers, header::ACCEPT);
    request.allowed_origin = state.cors.allowed_origin(origin.as_deref());
    request
}

async fn respond(state: &AppState, request: StreamRequest) -> Response<Body> {
    match state.responder.respond(&request).await {
        Ok(response) => into_http_response(response),
        Err(e) => error_response(&e, request.allowed_origin.as_deref()),
    }
}
