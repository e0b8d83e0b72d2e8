//! FOG Web - Media streaming and JSON API server
//!
//! Serves range-aware podcast playback over HTTP, with preflight handling
//! for browser players and a small JSON API over the catalog and storage.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]

pub mod cors;
pub mod handlers;
pub mod server;

// Re-export main types
pub use cors::CorsPolicy;
pub use server::{AppState, build_router, run_server};
