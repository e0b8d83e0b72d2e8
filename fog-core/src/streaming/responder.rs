//! Range-aware media streaming responder.
//!
//! Resolves a media id to its stored bytes, interprets an optional Range
//! header and produces a framed response whose body is read lazily, one
//! chunk at a time, as the transport drains it. Local sources support
//! partial content; remote sources are relayed whole because their length
//! is unknown up front.

use std::sync::Arc;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use futures::stream;
use tracing::{debug, error, info, warn};

use super::mime::{extension_for_mime, mime_for_extension, resolve_mime_type};
use super::range::{ByteRange, RangeSpec, parse_range_header};
use super::remote::RemoteFetcher;
use super::source::{MediaSource, SourceResolver, remote_file_stem};
use super::{StreamingError, StreamingResult};
use crate::catalog::{MediaCatalog, MediaId, MediaResource};
use crate::storage::{ByteStream, StorageBackend, StorageError};

/// Headers a browser player needs to read from cross-origin media responses.
pub const EXPOSED_MEDIA_HEADERS: &str = "Content-Range, Accept-Ranges, Content-Length";

/// How the client should present the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Play in place
    #[default]
    Inline,
    /// Save as a file
    Attachment,
}

/// One playback or download request.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Record to serve
    pub resource_id: MediaId,
    /// Raw Range header value
    pub range: Option<String>,
    /// Raw Accept header value
    pub accept: Option<String>,
    /// Allowed-origin value decided by the HTTP layer, copied verbatim
    pub allowed_origin: Option<String>,
    /// Inline playback or attachment download
    pub disposition: Disposition,
    /// Whether this request may count as a playback start
    pub count_playback: bool,
}

impl StreamRequest {
    /// Creates an inline playback request without headers.
    pub fn new(resource_id: impl Into<MediaId>) -> Self {
        Self {
            resource_id: resource_id.into(),
            range: None,
            accept: None,
            allowed_origin: None,
            disposition: Disposition::Inline,
            count_playback: true,
        }
    }

    /// Sets the raw Range header.
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    /// Sets the raw Accept header.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Sets the allowed-origin value to echo.
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = Some(origin.into());
        self
    }

    /// Turns this into a download: attachment disposition, never counted.
    pub fn as_download(mut self) -> Self {
        self.disposition = Disposition::Attachment;
        self.count_playback = false;
        self
    }

    /// Keeps the play counter untouched (e.g. for HEAD probes).
    pub fn without_playback(mut self) -> Self {
        self.count_playback = false;
        self
    }
}

/// Status, headers and lazy body of a streamed response.
pub struct StreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Whether a request with this resolved window starts a playback.
///
/// Seeks (windows starting past byte 0) do not.
pub fn counts_as_playback_start(range: Option<&ByteRange>) -> bool {
    range.is_none_or(|range| range.start == 0)
}

/// Copies the allowed-origin value onto a response, exposing range headers.
pub fn apply_allowed_origin(headers: &mut HeaderMap, allowed_origin: Option<&str>) {
    let Some(origin) = allowed_origin else {
        return;
    };

    match HeaderValue::from_str(origin) {
        Ok(value) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            headers.insert(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static(EXPOSED_MEDIA_HEADERS),
            );
            if origin != "*" {
                headers.append(header::VARY, HeaderValue::from_static("origin"));
            }
        }
        Err(_) => warn!("Dropping allowed origin that is not a valid header value: {origin:?}"),
    }
}

/// Streams catalogued media from local storage or a remote origin.
pub struct StreamResponder {
    catalog: Arc<dyn MediaCatalog>,
    storage: Arc<dyn StorageBackend>,
    fetcher: Arc<dyn RemoteFetcher>,
    sources: SourceResolver,
}

impl StreamResponder {
    /// Creates a responder over explicit collaborators.
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        storage: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn RemoteFetcher>,
        sources: SourceResolver,
    ) -> Self {
        Self {
            catalog,
            storage,
            fetcher,
            sources,
        }
    }

    /// Produces the response for one request.
    ///
    /// # Errors
    ///
    /// - `StreamingError::NotFound` - Id does not resolve to a record
    /// - `StreamingError::NoAudioAvailable` - Record has no audio reference
    /// - `StreamingError::UnsupportedSource` - Reference cannot be classified
    /// - `StreamingError::StorageInconsistency` - Record exists but its bytes do not
    /// - `StreamingError::RangeNotSatisfiable` - Range lies outside the resource
    /// - `StreamingError::UpstreamUnavailable` - Remote origin failed or was unreachable
    /// - `StreamingError::Catalog` / `StreamingError::Storage` - Backend failures
    pub async fn respond(&self, request: &StreamRequest) -> StreamingResult<StreamResponse> {
        let (resource, source) = self.resolve(&request.resource_id).await?;

        match source {
            MediaSource::Local { path } => self.respond_local(request, &resource, &path).await,
            MediaSource::Remote { url, reference } => {
                self.respond_remote(request, &resource, &url, &reference)
                    .await
            }
        }
    }

    async fn resolve(&self, id: &MediaId) -> StreamingResult<(MediaResource, MediaSource)> {
        let resource = self.catalog.resolve(id).await?.ok_or_else(|| {
            debug!("No media record for {}", id);
            StreamingError::NotFound {
                resource_id: id.clone(),
            }
        })?;

        let reference = resource.audio_reference().ok_or_else(|| {
            warn!("Media {} has no audio reference", id);
            StreamingError::NoAudioAvailable {
                resource_id: id.clone(),
            }
        })?;

        let source = self.sources.classify(reference).map_err(|e| {
            warn!("Media {} has an unsupported audio reference: {}", id, e);
            StreamingError::UnsupportedSource {
                resource_id: id.clone(),
                source: e,
            }
        })?;

        debug!("Media {} resolved to {:?}", id, source);
        Ok((resource, source))
    }

    async fn respond_local(
        &self,
        request: &StreamRequest,
        resource: &MediaResource,
        path: &str,
    ) -> StreamingResult<StreamResponse> {
        let id = &request.resource_id;
        let inconsistency = || {
            error!(
                "Storage inconsistency: media {} references {} but {} has no such file",
                id,
                path,
                self.storage.backend_type()
            );
            StreamingError::StorageInconsistency {
                resource_id: id.clone(),
                path: path.to_string(),
            }
        };

        if !self.storage.exists(path).await {
            return Err(inconsistency());
        }
        let total_size = match self.storage.size(path).await {
            Ok(size) => size,
            Err(StorageError::NotFound { .. }) => return Err(inconsistency()),
            Err(e) => return Err(e.into()),
        };

        let range_spec = request.range.as_deref().and_then(|raw| {
            let parsed = parse_range_header(raw);
            if parsed.is_none() {
                debug!("Ignoring malformed Range header {:?} for media {}", raw, id);
            }
            parsed
        });

        let window = match range_spec {
            Some(spec) => match spec.resolve(total_size) {
                Ok(window) => Some(window),
                Err(_) => {
                    warn!(
                        "Unsatisfiable range {:?} for media {} ({} bytes)",
                        request.range, id, total_size
                    );
                    return Err(StreamingError::RangeNotSatisfiable { length: total_size });
                }
            },
            None => None,
        };

        let (status, served) = match window {
            Some(window) => (StatusCode::PARTIAL_CONTENT, Some(window)),
            None if total_size == 0 => (StatusCode::OK, None),
            None => (
                StatusCode::OK,
                Some(ByteRange {
                    start: 0,
                    end: total_size - 1,
                }),
            ),
        };

        let body: ByteStream = match served {
            Some(served) => match self.storage.open_range(path, served.start, served.end).await {
                Ok(body) => body,
                Err(StorageError::NotFound { .. }) => return Err(inconsistency()),
                Err(e) => return Err(e.into()),
            },
            None => Box::pin(stream::empty()),
        };

        if request.count_playback && counts_as_playback_start(window.as_ref()) {
            self.record_playback(id).await;
        }

        let content_type = resolve_mime_type(
            path,
            resource.mime_hint.as_deref(),
            request.accept.as_deref(),
        );
        let content_length = served.map_or(0, |served| served.byte_count());

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, header::CONTENT_TYPE, &content_type);
        insert_header(&mut headers, header::CONTENT_LENGTH, &content_length.to_string());
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        if let Some(window) = window {
            insert_header(
                &mut headers,
                header::CONTENT_RANGE,
                &window.content_range(total_size),
            );
        }
        insert_disposition(&mut headers, request.disposition, path);
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        apply_allowed_origin(&mut headers, request.allowed_origin.as_deref());

        info!(
            "Streaming media {} from {}: status={}, bytes={}, total={}",
            id,
            path,
            status.as_u16(),
            content_length,
            total_size
        );

        Ok(StreamResponse {
            status,
            headers,
            body,
        })
    }

    async fn respond_remote(
        &self,
        request: &StreamRequest,
        resource: &MediaResource,
        url: &url::Url,
        reference: &str,
    ) -> StreamingResult<StreamResponse> {
        let id = &request.resource_id;
        let unavailable = |reason: String| {
            warn!("Upstream for media {} at {} unavailable: {}", id, url, reason);
            StreamingError::UpstreamUnavailable {
                url: url.to_string(),
                reason,
            }
        };

        let upstream = self
            .fetcher
            .stream_get(url)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if upstream.status != 200 {
            return Err(unavailable(format!("origin returned {}", upstream.status)));
        }

        // Length is unknown up front, so ranges are not honoured; only a
        // request from byte 0 (or none) is a playback start.
        let starts_playback = match request.range.as_deref().and_then(parse_range_header) {
            None => true,
            Some(RangeSpec::From { start, .. }) => start == 0,
            Some(RangeSpec::Suffix { .. }) => false,
        };
        if request.count_playback && starts_playback {
            self.record_playback(id).await;
        }

        let content_type = resolve_mime_type(
            reference,
            resource.mime_hint.as_deref(),
            request.accept.as_deref(),
        );

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, header::CONTENT_TYPE, &content_type);
        if let Some(length) = upstream.content_length {
            insert_header(&mut headers, header::CONTENT_LENGTH, &length.to_string());
        }
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("none"));
        let file_name = remote_file_name(resource, reference, &content_type);
        insert_disposition(&mut headers, request.disposition, &file_name);
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        apply_allowed_origin(&mut headers, request.allowed_origin.as_deref());

        info!("Proxying media {} from {}", id, url);

        Ok(StreamResponse {
            status: StatusCode::OK,
            headers,
            body: upstream.body,
        })
    }

    async fn record_playback(&self, id: &MediaId) {
        // Bookkeeping failures never fail the stream itself
        if let Err(e) = self.catalog.increment_play_count(id).await {
            warn!("Failed to record playback of media {}: {}", id, e);
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => warn!("Skipping invalid {} header value {:?}", name, value),
    }
}

/// Download name for proxied bytes: the reference's file name, else the
/// record title, with an extension matching `content_type` when it has none.
fn remote_file_name(resource: &MediaResource, reference: &str, content_type: &str) -> String {
    let stem = remote_file_stem(reference)
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or_else(|| resource.title.replace('/', " "));
    if mime_for_extension(&stem).is_some() {
        return stem;
    }
    match extension_for_mime(content_type) {
        Some(extension) => format!("{stem}.{extension}"),
        None => stem,
    }
}

fn insert_disposition(headers: &mut HeaderMap, disposition: Disposition, path: &str) {
    let value = match disposition {
        Disposition::Inline => "inline".to_string(),
        Disposition::Attachment => {
            let file_name: String = path
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .chars()
                .filter(|c| (c.is_ascii_graphic() && *c != '"' && *c != '\\') || *c == ' ')
                .collect();
            if file_name.trim().is_empty() {
                "attachment".to_string()
            } else {
                format!("attachment; filename=\"{}\"", file_name.trim())
            }
        }
    };
    insert_header(headers, header::CONTENT_DISPOSITION, &value);
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::config::{RemoteConfig, StorageConfig};
    use crate::storage::LocalStorage;
    use crate::storage::test_fixtures::{audio_bytes, create_audio_fixture, create_temp_storage};
    use crate::streaming::test_fixtures::FakeRemoteFetcher;

    struct Harness {
        _temp_dir: tempfile::TempDir,
        catalog: InMemoryCatalog,
        fetcher: FakeRemoteFetcher,
        responder: StreamResponder,
    }

    fn harness(chunk_size: usize) -> Harness {
        let (temp_dir, storage) = create_temp_storage(chunk_size);
        create_audio_fixture(storage.root(), "podcasts/audio/podcast42.mp3", 100_000);
        create_audio_fixture(storage.root(), "empty.mp3", 0);

        let catalog = InMemoryCatalog::from_resources([
            MediaResource::new(
                42u64,
                "Sunday Service",
                Some("/storage/podcasts/audio/podcast42.mp3".to_string()),
            ),
            MediaResource::new(43u64, "No audio", None),
            MediaResource::new(
                44u64,
                "Forbidden upstream",
                Some("https://drive.google.com/file/d/forbidden/view".to_string()),
            ),
            MediaResource::new(45u64, "Missing bytes", Some("gone.mp3".to_string())),
            MediaResource::new(
                46u64,
                "Shared episode",
                Some("https://drive.google.com/open?id=shared".to_string()),
            ),
            MediaResource::new(47u64, "Folder", Some("https://drive.google.com/drive/folders/x".to_string())),
            MediaResource::new(48u64, "Empty", Some("empty.mp3".to_string())),
            MediaResource::new(
                49u64,
                "Unreachable",
                Some("https://cdn.example.org/ep49.ogg".to_string()),
            ),
        ]);

        let fetcher = FakeRemoteFetcher::new();
        fetcher
            .respond(
                "https://drive.google.com/uc?export=download&id=forbidden",
                403,
                Vec::new(),
                1,
            )
            .respond(
                "https://drive.google.com/uc?export=download&id=shared",
                200,
                audio_bytes(5000),
                1024,
            )
            .refuse("https://cdn.example.org/ep49.ogg");

        let responder = StreamResponder::new(
            Arc::new(catalog.clone()),
            Arc::new(LocalStorage::new(temp_dir.path(), chunk_size)),
            Arc::new(fetcher.clone()),
            SourceResolver::from_config(&StorageConfig::default(), &RemoteConfig::default()),
        );

        Harness {
            _temp_dir: temp_dir,
            catalog,
            fetcher,
            responder,
        }
    }

    async fn body_of(response: StreamResponse) -> Vec<u8> {
        let chunks: Vec<bytes::Bytes> = response.body.try_collect().await.unwrap();
        chunks.concat()
    }

    fn header_of<'a>(response: &'a StreamResponse, name: HeaderName) -> Option<&'a str> {
        response.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_full_response_without_range() {
        let h = harness(8192);
        let response = h.responder.respond(&StreamRequest::new(42u64)).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(header_of(&response, header::CONTENT_LENGTH), Some("100000"));
        assert_eq!(header_of(&response, header::ACCEPT_RANGES), Some("bytes"));
        assert_eq!(header_of(&response, header::CONTENT_TYPE), Some("audio/mpeg"));
        assert!(header_of(&response, header::CONTENT_RANGE).is_none());
        assert_eq!(body_of(response).await, audio_bytes(100_000));
    }

    #[tokio::test]
    async fn test_partial_response_for_first_hundred_bytes() {
        let h = harness(8192);
        let request = StreamRequest::new(42u64).with_range("bytes=0-99");
        let response = h.responder.respond(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            header_of(&response, header::CONTENT_RANGE),
            Some("bytes 0-99/100000")
        );
        assert_eq!(header_of(&response, header::CONTENT_LENGTH), Some("100"));
        assert_eq!(header_of(&response, header::CONTENT_DISPOSITION), Some("inline"));
        assert_eq!(body_of(response).await, audio_bytes(100));
    }

    #[tokio::test]
    async fn test_open_ended_range() {
        let h = harness(8192);
        let request = StreamRequest::new(42u64).with_range("bytes=99000-");
        let response = h.responder.respond(&request).await.unwrap();

        assert_eq!(
            header_of(&response, header::CONTENT_RANGE),
            Some("bytes 99000-99999/100000")
        );
        assert_eq!(body_of(response).await, audio_bytes(100_000)[99_000..].to_vec());
    }

    #[tokio::test]
    async fn test_unsatisfiable_ranges() {
        let h = harness(8192);
        for range in ["bytes=100000-", "bytes=0-100000", "bytes=500-100"] {
            let request = StreamRequest::new(42u64).with_range(range);
            let error = h.responder.respond(&request).await.unwrap_err();

            assert!(
                matches!(error, StreamingError::RangeNotSatisfiable { length: 100_000 }),
                "{range}"
            );
            assert_eq!(error.status_code(), StatusCode::RANGE_NOT_SATISFIABLE);
            assert_eq!(error.content_range().as_deref(), Some("bytes */100000"));
        }
        assert_eq!(h.catalog.play_count(&MediaId::from(42u64)), Some(0));
    }

    #[tokio::test]
    async fn test_malformed_range_falls_back_to_full_content() {
        let h = harness(8192);
        let request = StreamRequest::new(42u64).with_range("bytes=abc");
        let response = h.responder.respond(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(header_of(&response, header::CONTENT_LENGTH), Some("100000"));
    }

    #[tokio::test]
    async fn test_play_count_policy() {
        let h = harness(8192);
        let id = MediaId::from(42u64);

        h.responder.respond(&StreamRequest::new(42u64)).await.unwrap();
        assert_eq!(h.catalog.play_count(&id), Some(1));

        let from_zero = StreamRequest::new(42u64).with_range("bytes=0-");
        h.responder.respond(&from_zero).await.unwrap();
        assert_eq!(h.catalog.play_count(&id), Some(2));

        let seek = StreamRequest::new(42u64).with_range("bytes=4096-8191");
        h.responder.respond(&seek).await.unwrap();
        assert_eq!(h.catalog.play_count(&id), Some(2));

        let download = StreamRequest::new(42u64).as_download();
        h.responder.respond(&download).await.unwrap();
        assert_eq!(h.catalog.play_count(&id), Some(2));
    }

    #[tokio::test]
    async fn test_missing_record_and_audio() {
        let h = harness(8192);

        let error = h.responder.respond(&StreamRequest::new(7u64)).await.unwrap_err();
        assert!(matches!(error, StreamingError::NotFound { .. }));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);

        let error = h.responder.respond(&StreamRequest::new(43u64)).await.unwrap_err();
        assert!(matches!(error, StreamingError::NoAudioAvailable { .. }));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.user_message(), "Audio URL not available");
    }

    #[tokio::test]
    async fn test_storage_inconsistency() {
        let h = harness(8192);
        let error = h.responder.respond(&StreamRequest::new(45u64)).await.unwrap_err();

        assert!(matches!(
            &error,
            StreamingError::StorageInconsistency { path, .. } if path == "gone.mp3"
        ));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_source() {
        let h = harness(8192);
        let error = h.responder.respond(&StreamRequest::new(47u64)).await.unwrap_err();

        assert!(matches!(error, StreamingError::UnsupportedSource { .. }));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let h = harness(8192);
        let response = h.responder.respond(&StreamRequest::new(48u64)).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(header_of(&response, header::CONTENT_LENGTH), Some("0"));
        assert!(body_of(response).await.is_empty());

        let ranged = StreamRequest::new(48u64).with_range("bytes=0-");
        let error = h.responder.respond(&ranged).await.unwrap_err();
        assert!(matches!(error, StreamingError::RangeNotSatisfiable { length: 0 }));
    }

    #[tokio::test]
    async fn test_remote_proxy_streams_full_content() {
        let h = harness(8192);
        let request = StreamRequest::new(46u64).with_range("bytes=100-200");
        let response = h.responder.respond(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(header_of(&response, header::ACCEPT_RANGES), Some("none"));
        assert_eq!(header_of(&response, header::CONTENT_LENGTH), Some("5000"));
        assert_eq!(header_of(&response, header::CONTENT_TYPE), Some("audio/mpeg"));
        assert_eq!(body_of(response).await, audio_bytes(5000));
        assert_eq!(
            h.fetcher.requests(),
            vec!["https://drive.google.com/uc?export=download&id=shared".to_string()]
        );
        // a mid-file range is a seek even when proxied
        assert_eq!(h.catalog.play_count(&MediaId::from(46u64)), Some(0));
    }

    #[tokio::test]
    async fn test_upstream_failures() {
        let h = harness(8192);

        let error = h.responder.respond(&StreamRequest::new(44u64)).await.unwrap_err();
        assert!(matches!(error, StreamingError::UpstreamUnavailable { .. }));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);

        let error = h.responder.respond(&StreamRequest::new(49u64)).await.unwrap_err();
        assert!(matches!(error, StreamingError::UpstreamUnavailable { .. }));
        assert_eq!(h.catalog.play_count(&MediaId::from(44u64)), Some(0));
    }

    #[tokio::test]
    async fn test_allowed_origin_copied_through() {
        let h = harness(8192);
        let request = StreamRequest::new(42u64)
            .with_range("bytes=0-1")
            .with_allowed_origin("http://localhost:3000");
        let response = h.responder.respond(&request).await.unwrap();

        assert_eq!(
            header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some("http://localhost:3000")
        );
        assert_eq!(
            header_of(&response, header::ACCESS_CONTROL_EXPOSE_HEADERS),
            Some(EXPOSED_MEDIA_HEADERS)
        );
    }

    #[tokio::test]
    async fn test_download_uses_attachment() {
        let h = harness(8192);
        let request = StreamRequest::new(42u64).as_download();
        let response = h.responder.respond(&request).await.unwrap();

        assert_eq!(
            header_of(&response, header::CONTENT_DISPOSITION),
            Some("attachment; filename=\"podcast42.mp3\"")
        );
    }

    #[tokio::test]
    async fn test_remote_download_named_from_reference() {
        let h = harness(8192);
        let response = h
            .responder
            .respond(&StreamRequest::new(46u64).as_download())
            .await
            .unwrap();

        assert_eq!(
            header_of(&response, header::CONTENT_DISPOSITION),
            Some("attachment; filename=\"shared.mp3\"")
        );
    }

    #[test]
    fn test_remote_file_name_fallbacks() {
        let titled = MediaResource::new(7u64, "Advent/Week 1", None);

        assert_eq!(
            remote_file_name(&titled, "https://cdn.example.org/ep49.ogg", "audio/ogg"),
            "ep49.ogg"
        );
        assert_eq!(
            remote_file_name(&titled, "https://cdn.example.org/feed/latest", "audio/mp4"),
            "latest.m4a"
        );
        assert_eq!(
            remote_file_name(&titled, "https://cdn.example.org/", "audio/mpeg"),
            "Advent Week 1.mp3"
        );
    }

    #[test]
    fn test_counts_as_playback_start() {
        assert!(counts_as_playback_start(None));
        assert!(counts_as_playback_start(Some(&ByteRange { start: 0, end: 99 })));
        assert!(!counts_as_playback_start(Some(&ByteRange {
            start: 4096,
            end: 8191
        })));
    }
}
