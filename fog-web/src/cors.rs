//! Cross-origin policy for media and API routes.
//!
//! Media responses echo a single allowed origin computed here; the JSON API
//! gets an equivalent `tower_http` layer.

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use fog_core::config::CorsConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Methods advertised by the media stream preflight.
pub const PREFLIGHT_METHODS: &str = "GET, HEAD, OPTIONS";

/// Request headers a media player may send.
pub const PREFLIGHT_HEADERS: &str = "Range, Accept, Origin, Content-Type";

/// Decides which request origins may read media responses.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allow_any: bool,
    max_age: Duration,
}

impl CorsPolicy {
    /// Builds the policy from configuration.
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allow_any: config.allowed_origins.iter().any(|origin| origin == "*"),
            allowed_origins: config
                .allowed_origins
                .iter()
                .filter(|origin| origin.as_str() != "*")
                .map(|origin| origin.trim_end_matches('/').to_string())
                .collect(),
            max_age: config.max_age,
        }
    }

    /// Allowed-origin value to attach for a request carrying `origin`.
    ///
    /// Listed origins are echoed back. With `*` configured, the request
    /// origin is echoed too, or `*` when the request sent none.
    pub fn allowed_origin(&self, origin: Option<&str>) -> Option<String> {
        match origin {
            Some(origin) if self.allow_any => Some(origin.to_string()),
            Some(origin) => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed == origin.trim_end_matches('/'))
                .then(|| origin.to_string()),
            None if self.allow_any => Some("*".to_string()),
            None => None,
        }
    }

    /// Preflight cache lifetime.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Equivalent `CorsLayer` for the JSON API routes.
    pub fn api_layer(&self) -> CorsLayer {
        let allow_origin = if self.allow_any {
            AllowOrigin::any()
        } else {
            let origins: Vec<HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid allowed origin {:?}", origin);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
            .max_age(self.max_age)
    }
}
