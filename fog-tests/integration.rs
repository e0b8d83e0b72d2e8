//! Integration tests for FOG
//!
//! These tests drive the full HTTP router in-process against temporary
//! storage, an in-memory catalog and a scripted remote origin. They verify
//! response framing, error mapping, play-count bookkeeping and origin
//! handling as a browser player would observe them.

#[path = "common/mod.rs"]
mod common;

#[path = "style.rs"]
mod style;

#[path = "integration/api_endpoints.rs"]
mod api_endpoints;
#[path = "integration/media_streaming.rs"]
mod media_streaming;
#[path = "integration/range_properties.rs"]
mod range_properties;
