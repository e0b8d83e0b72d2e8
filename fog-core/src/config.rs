//! Centralized configuration for the FOG media services.
//!
//! All tunable parameters live here and are passed explicitly into the
//! components that need them, so tests can build independent instances
//! against temporary directories.

use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all FOG components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct FogConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
    pub remote: RemoteConfig,
    pub catalog: CatalogConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Local media storage configuration.
///
/// Controls where stored media lives on disk and how it is read back
/// when streamed to clients.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory all local media references resolve under
    pub root: PathBuf,
    /// Size of each chunk yielded by a streaming body
    pub chunk_size: usize,
    /// Public URL prefixes stripped from local references before resolution
    pub public_prefixes: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage/files"),
            chunk_size: 8192, // 8 KiB
            public_prefixes: vec!["/storage/".to_string(), "/uploads/".to_string()],
        }
    }
}

/// Cross-origin policy configuration.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Origins allowed to read media responses; `*` allows any origin
    pub allowed_origins: Vec<String>,
    /// How long browsers may cache a preflight response
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
            max_age: Duration::from_secs(3600),
        }
    }
}

/// Remote origin (proxied media) configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Connect timeout when opening an upstream stream
    pub connect_timeout: Duration,
    /// User agent sent to upstream origins
    pub user_agent: String,
    /// Direct-fetch endpoint that shared Drive file ids are rewritten to
    pub drive_download_base: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("fog-media/{}", env!("CARGO_PKG_VERSION")),
            drive_download_base: "https://drive.google.com/uc".to_string(),
        }
    }
}

/// Content-record catalog configuration.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// JSON manifest the in-memory catalog is loaded from
    pub manifest: Option<PathBuf>,
}

impl FogConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("FOG_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("FOG_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.port = port;
            }
        }

        if let Ok(root) = std::env::var("FOG_STORAGE_ROOT") {
            config.storage.root = PathBuf::from(root);
        }

        if let Ok(chunk_size) = std::env::var("FOG_CHUNK_SIZE") {
            if let Ok(size) = chunk_size.parse::<usize>() {
                if size > 0 {
                    config.storage.chunk_size = size;
                }
            }
        }

        if let Ok(origins) = std::env::var("FOG_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = parse_origin_list(&origins);
        }

        if let Ok(timeout) = std::env::var("FOG_REMOTE_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.remote.connect_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(manifest) = std::env::var("FOG_CATALOG") {
            config.catalog.manifest = Some(PathBuf::from(manifest));
        }

        config
    }

    /// Creates a configuration for tests rooted at the given storage directory.
    pub fn for_testing(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                root: storage_root.into(),
                ..Default::default()
            },
            cors: CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
                ..Default::default()
            },
            remote: RemoteConfig {
                connect_timeout: Duration::from_secs(1),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Splits a comma separated origin list, dropping empty entries.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = FogConfig::default();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.chunk_size, 8192);
        assert_eq!(config.storage.root, PathBuf::from("storage/files"));
        assert_eq!(config.cors.allowed_origins.len(), 2);
        assert_eq!(config.remote.connect_timeout, Duration::from_secs(10));
        assert!(config.catalog.manifest.is_none());
    }

    #[test]
    fn test_for_testing_uses_given_root() {
        let config = FogConfig::for_testing("/tmp/fog-test");

        assert_eq!(config.storage.root, PathBuf::from("/tmp/fog-test"));
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:3000".to_string()]
        );
    }

    #[test]
    fn test_parse_origin_list() {
        assert_eq!(
            parse_origin_list(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origin_list("").is_empty());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("FOG_PORT", "9100");
            std::env::set_var("FOG_STORAGE_ROOT", "/srv/fog");
            std::env::set_var("FOG_CHUNK_SIZE", "0");
            std::env::set_var("FOG_ALLOWED_ORIGINS", "https://fog.example,*");
            std::env::set_var("FOG_CATALOG", "/srv/fog/catalog.json");
        }

        let config = FogConfig::from_env();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.root, PathBuf::from("/srv/fog"));
        // zero is rejected, default kept
        assert_eq!(config.storage.chunk_size, 8192);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://fog.example".to_string(), "*".to_string()]
        );
        assert_eq!(
            config.catalog.manifest,
            Some(PathBuf::from("/srv/fog/catalog.json"))
        );

        // Cleanup
        unsafe {
            std::env::remove_var("FOG_PORT");
            std::env::remove_var("FOG_STORAGE_ROOT");
            std::env::remove_var("FOG_CHUNK_SIZE");
            std::env::remove_var("FOG_ALLOWED_ORIGINS");
            std::env::remove_var("FOG_CATALOG");
        }
    }
}
