//! End-to-end tests for FOG
//!
//! These tests run the server on real sockets and exercise complete
//! listener workflows, including proxying from a live remote origin.

mod playback_session;
