//! Conversion between HTTP requests/responses and streaming types
//!
//! Pulls the Range, Accept and Origin headers off incoming requests and
//! turns responder output, successful or not, into axum responses.

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Response, StatusCode};
use axum::response::{IntoResponse, Json};
use fog_core::streaming::{StreamResponse, StreamingError, apply_allowed_origin};
use serde_json::json;
use tracing::error;

/// Returns a header as an owned string, if present and valid UTF-8.
pub fn extract_header(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Extracts the raw Range header.
pub fn extract_range_header(headers: &HeaderMap) -> Option<String> {
    extract_header(headers, header::RANGE)
}

/// Wraps a responder result in an axum response with a streaming body.
pub fn into_http_response(response: StreamResponse) -> Response<Body> {
    let StreamResponse {
        status,
        headers,
        body,
    } = response;

    let mut http = Response::new(Body::from_stream(body));
    *http.status_mut() = status;
    *http.headers_mut() = headers;
    http
}

/// Builds the error response for a failed stream request.
///
/// A 416 carries an empty body and `Content-Range: bytes */<length>`; all
/// others carry `{"detail": <message>}`.
pub fn error_response(error: &StreamingError, allowed_origin: Option<&str>) -> Response<Body> {
    let status = error.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Stream request failed: {}", error);
    }

    let mut response = match error.content_range() {
        Some(content_range) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&content_range) {
                headers.insert(header::CONTENT_RANGE, value);
            }
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            response
        }
        None => (status, Json(json!({ "detail": error.user_message() }))).into_response(),
    };

    apply_allowed_origin(response.headers_mut(), allowed_origin);
    response
}

#[cfg(test)]
mod tests {
    use fog_core::MediaId;

    use super::*;

    #[test]
    fn test_extract_range_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_range_header(&headers), None);

        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-99"));
        assert_eq!(extract_range_header(&headers).as_deref(), Some("bytes=0-99"));
    }

    #[test]
    fn test_unsatisfiable_response_has_empty_body_and_content_range() {
        let error = StreamingError::RangeNotSatisfiable { length: 1000 };
        let response = error_response(&error, Some("http://localhost:3000"));

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1000"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_not_found_response_is_json() {
        let error = StreamingError::NoAudioAvailable {
            resource_id: MediaId::from(43u64),
        };
        let response = error_response(&error, None);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
