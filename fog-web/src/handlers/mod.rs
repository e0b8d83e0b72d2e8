//! HTTP request handlers organized by functionality

pub mod api;
pub mod range;
pub mod streaming;

// Re-export handler functions
pub use api::{MediaSummary, api_health, api_media, api_media_list, api_storage_info};
pub use range::{error_response, extract_range_header, into_http_response};
pub use streaming::{download_media, stream_media, stream_preflight};
