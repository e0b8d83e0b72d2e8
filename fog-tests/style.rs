//! Style Enforcement Tests
//!
//! Enforces patterns that cannot be easily caught by clippy alone. These
//! tests scan the production crates and fail if violations are found.

#[path = "style/production_code.rs"]
mod production_code;
