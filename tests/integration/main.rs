//! Integration tests for the Weaviate Rust client.
//!
//! Everything here runs offline: the pipeline and client are exercised
//! against the in-memory transports from `weaviate::testing`, and the HTTP
//! transport against a local `wiremock` server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//!
//! # With pipeline logging
//! RUST_LOG=weaviate=trace cargo test --test integration -- --nocapture
//! ```

mod client_tests;
mod common;
#[cfg(feature = "rest")]
mod http_client_tests;
mod mock_transport_tests;
mod pipeline_tests;
