//! Classification of audio references into local or proxied sources.
//!
//! Records store audio either as a path into local storage (optionally in
//! its public `/storage/...` URL form) or as a remote URL. Drive sharing
//! links are rewritten to their direct-fetch form; other http(s) URLs are
//! fetched as-is.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::{RemoteConfig, StorageConfig};

static DRIVE_FILE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("static regex"));
static DRIVE_FILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"));

const DRIVE_HOSTS: &[&str] = &["drive.google.com", "docs.google.com"];

/// Where a record's audio bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Path relative to the local storage root
    Local {
        /// Backend-relative path
        path: String,
    },
    /// Remote origin streamed through the proxy
    Remote {
        /// Direct-fetch URL to request
        url: Url,
        /// Reference as stored on the record, used for MIME inference
        reference: String,
    },
}

/// Errors raised while classifying a reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Reference matches no supported local or remote form
    #[error("Unsupported audio source {reference}: {reason}")]
    Unsupported {
        /// The stored reference
        reference: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Turns stored references into [`MediaSource`]s.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    public_prefixes: Vec<String>,
    drive_download_base: String,
}

impl SourceResolver {
    /// Creates a resolver stripping `public_prefixes` from local references
    /// and rewriting Drive links onto `drive_download_base`.
    pub fn new(public_prefixes: Vec<String>, drive_download_base: impl Into<String>) -> Self {
        Self {
            public_prefixes,
            drive_download_base: drive_download_base.into(),
        }
    }

    /// Creates a resolver from configuration.
    pub fn from_config(storage: &StorageConfig, remote: &RemoteConfig) -> Self {
        Self::new(
            storage.public_prefixes.clone(),
            remote.drive_download_base.clone(),
        )
    }

    /// Classifies a non-empty reference.
    ///
    /// # Errors
    ///
    /// - `SourceError::Unsupported` - Unparseable URL, non-http scheme, Drive
    ///   folder link or link without a file id, or a local path escaping storage
    pub fn classify(&self, reference: &str) -> Result<MediaSource, SourceError> {
        let reference = reference.trim();
        if reference.contains("://") {
            self.classify_remote(reference)
        } else {
            self.classify_local(reference)
        }
    }

    fn classify_remote(&self, reference: &str) -> Result<MediaSource, SourceError> {
        let unsupported = |reason: &str| SourceError::Unsupported {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(reference).map_err(|e| unsupported(&format!("invalid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(unsupported(&format!("scheme {} is not supported", url.scheme())));
        }

        let host = url.host_str().ok_or_else(|| unsupported("URL has no host"))?;
        if !DRIVE_HOSTS.contains(&host) {
            return Ok(MediaSource::Remote {
                url,
                reference: reference.to_string(),
            });
        }

        if url.path().contains("/folders/") {
            return Err(unsupported("Drive folder links cannot be streamed"));
        }

        let file_id =
            extract_drive_file_id(&url).ok_or_else(|| unsupported("no Drive file id found"))?;
        let direct = Url::parse_with_params(
            &self.drive_download_base,
            &[("export", "download"), ("id", file_id.as_str())],
        )
        .map_err(|e| unsupported(&format!("invalid Drive download base: {e}")))?;

        Ok(MediaSource::Remote {
            url: direct,
            reference: reference.to_string(),
        })
    }

    fn classify_local(&self, reference: &str) -> Result<MediaSource, SourceError> {
        let unsupported = |reason: &str| SourceError::Unsupported {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let path = match self
            .public_prefixes
            .iter()
            .find_map(|prefix| reference.strip_prefix(prefix.as_str()))
        {
            // Public URLs are percent-encoded
            Some(stripped) => urlencoding::decode(stripped)
                .map_err(|_| unsupported("path is not valid UTF-8 once decoded"))?
                .into_owned(),
            None => reference.to_string(),
        };

        let mut has_file = false;
        for component in Path::new(&path).components() {
            match component {
                Component::Normal(_) => has_file = true,
                Component::CurDir => {}
                Component::ParentDir => return Err(unsupported("path climbs out of storage")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(unsupported("absolute path outside storage"));
                }
            }
        }
        if !has_file {
            return Err(unsupported("empty storage path"));
        }

        Ok(MediaSource::Local { path })
    }
}

/// Extracts the file id from a Drive sharing or download URL.
///
/// Understands `/file/d/<id>/...` and `?id=<id>` forms.
pub fn extract_drive_file_id(url: &Url) -> Option<String> {
    if let Some(captures) = DRIVE_FILE_PATH.captures(url.path()) {
        return captures.get(1).map(|id| id.as_str().to_string());
    }

    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, id)| id.into_owned())
        .filter(|id| DRIVE_FILE_ID.is_match(id))
}

/// Name a remote reference's bytes should be saved under, if it has one.
///
/// Drive links are named by their file id since their paths end in `view`
/// or `open`; other URLs by their last non-empty path segment.
pub fn remote_file_stem(reference: &str) -> Option<String> {
    let url = Url::parse(reference.trim()).ok()?;
    if url.host_str().is_some_and(|host| DRIVE_HOSTS.contains(&host)) {
        return extract_drive_file_id(&url);
    }

    let segment = url.path_segments()?.rev().find(|segment| !segment.is_empty())?;
    urlencoding::decode(segment)
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SourceResolver {
        SourceResolver::from_config(&StorageConfig::default(), &RemoteConfig::default())
    }

    fn assert_unsupported(reference: &str) {
        assert!(
            matches!(
                resolver().classify(reference),
                Err(SourceError::Unsupported { .. })
            ),
            "{reference}"
        );
    }

    #[test]
    fn test_local_references() {
        let resolver = resolver();

        assert_eq!(
            resolver.classify("podcast42.mp3").unwrap(),
            MediaSource::Local {
                path: "podcast42.mp3".to_string()
            }
        );
        assert_eq!(
            resolver
                .classify("/storage/podcasts/audio/Sunday%20Service.m4a")
                .unwrap(),
            MediaSource::Local {
                path: "podcasts/audio/Sunday Service.m4a".to_string()
            }
        );
        assert_eq!(
            resolver.classify("/uploads/podcasts/ep1.mp3").unwrap(),
            MediaSource::Local {
                path: "podcasts/ep1.mp3".to_string()
            }
        );
    }

    #[test]
    fn test_local_escapes_rejected() {
        assert_unsupported("/etc/passwd");
        assert_unsupported("../outside.mp3");
        assert_unsupported("/storage/../../etc/passwd");
        assert_unsupported("/storage/");
    }

    #[test]
    fn test_drive_links_rewritten() {
        let resolver = resolver();
        let expected = "https://drive.google.com/uc?export=download&id=1AbC_d-9";

        for link in [
            "https://drive.google.com/file/d/1AbC_d-9/view?usp=sharing",
            "https://drive.google.com/open?id=1AbC_d-9",
            "https://docs.google.com/uc?export=download&id=1AbC_d-9",
        ] {
            match resolver.classify(link).unwrap() {
                MediaSource::Remote { url, reference } => {
                    assert_eq!(url.as_str(), expected);
                    assert_eq!(reference, link);
                }
                other => panic!("expected remote source, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unsupported_remote_forms() {
        assert_unsupported("https://drive.google.com/drive/folders/1WzmdDfCQt");
        assert_unsupported("https://drive.google.com/file/view");
        assert_unsupported("https://drive.google.com/open?id=bad%20id");
        assert_unsupported("ftp://files.example/ep.mp3");
        assert_unsupported("https://");
    }

    #[test]
    fn test_plain_urls_proxied_as_is() {
        let source = resolver()
            .classify("https://cdn.example.org/audio/ep3.mp3")
            .unwrap();
        assert!(matches!(
            source,
            MediaSource::Remote { url, .. } if url.as_str() == "https://cdn.example.org/audio/ep3.mp3"
        ));
    }

    #[test]
    fn test_remote_file_stem() {
        assert_eq!(
            remote_file_stem("https://drive.google.com/file/d/1AbC_x-9/view?usp=sharing").as_deref(),
            Some("1AbC_x-9")
        );
        assert_eq!(
            remote_file_stem("https://drive.google.com/open?id=shared").as_deref(),
            Some("shared")
        );
        assert_eq!(
            remote_file_stem("https://cdn.example.org/audio/Sunday%20Service.ogg?sig=1").as_deref(),
            Some("Sunday Service.ogg")
        );
        assert_eq!(remote_file_stem("https://cdn.example.org/"), None);
        assert_eq!(remote_file_stem("not a url"), None);
    }
}
