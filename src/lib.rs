//! # Weaviate Rust Client
//!
//! Request pipeline, transports and offline test harness for a Weaviate
//! client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weaviate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::connect(ClientConfig::local())?;
//!
//!     let meta = client.meta().await?;
//!     println!("connected to Weaviate {}", meta.version);
//!
//!     let articles = client.get_collection("Articles").await?;
//!     println!("Articles exists: {}", articles.is_some());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **Logical request**: *what* to do ([`request::LogicalRequest`]), with a
//!   stable operation name such as `CollectionCreate`
//! - **Context**: the request plus cancellation, timeout, metadata and
//!   addressing ([`request::RequestContext`]); never mutated in place
//! - **Pipeline**: before-send interceptors in order, the executor exactly
//!   once, after-receive interceptors in reverse, error interceptors on
//!   failure ([`pipeline::RequestPipeline`])
//! - **Transport**: *how* it is sent, REST ([`transport::RestTransport`]) or
//!   gRPC ([`transport::GrpcTransport`])
//! - **Errors pass through**: the caller receives exactly the error the
//!   transport raised
//!
//! ## Features
//!
//! - `grpc` (default): Enable the gRPC transport via tonic
//! - `rest` (default): Enable the REST transport via reqwest
//! - `rustls` (default): Use rustls for TLS
//! - `native-tls`: Use native TLS (OpenSSL on Linux, Secure Transport on macOS)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod request;

// Interception
pub mod interceptors;
pub mod pipeline;

// Transport layer
pub mod transport;

// Testing utilities
pub mod testing;

// Prelude for convenient imports
pub mod prelude;

// Client identification
pub mod user_agent;

// Re-export main types at crate root for convenience
pub use client::Client;
pub use config::{ClientConfig, RetryConfig, TimeoutConfig};
pub use error::{Error, ErrorKind, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_reexports() {
        let config = ClientConfig::local();
        assert!(config.validate().is_ok());
        assert!(RetryConfig::default().is_enabled());
        assert_eq!(Error::from_kind(ErrorKind::NotFound).kind(), ErrorKind::NotFound);
    }
}
