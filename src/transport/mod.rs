//! Transport layer for Weaviate communication.
//!
//! The transport layer sits below the request pipeline: the pipeline's
//! executor closure hands a [`RestRequestDetails`] or [`GrpcRequestDetails`]
//! to a transport, and whatever the transport returns flows back through the
//! after-receive interceptors.
//!
//! - [`RestTransport`]: JSON over HTTP (via reqwest with the `rest` feature)
//! - [`GrpcTransport`]: unary prost calls (via tonic with the `grpc` feature)
//!
//! In-memory implementations of both live in [`testing`](crate::testing).
//!
//! ## Feature Flags
//!
//! - `grpc` (default): Enable [`TonicTransport`]
//! - `rest` (default): Enable [`HttpTransport`]
//!
//! ## Example
//!
//! ```rust
//! use weaviate::transport::{HttpMethod, RestRequestDetails};
//!
//! let details = RestRequestDetails::get("/v1/schema")
//!     .query("tenant", "tenant a")
//!     .header("X-Trace", "1");
//!
//! assert_eq!(details.method, HttpMethod::Get);
//! assert_eq!(details.path, "/v1/schema?tenant=tenant%20a");
//! ```

mod decode;
pub mod health;
pub(crate) mod retry;
mod traits;

#[cfg(feature = "grpc")]
mod grpc;

#[cfg(feature = "rest")]
mod rest;

pub use health::{HEALTH_CHECK_METHOD, HealthCheckRequest, HealthCheckResponse, ServingStatus};
pub use traits::{
    GrpcRequestDetails, GrpcTransport, HttpMethod, RestRequestDetails, RestResponse,
    RestTransport, RestTransportExt,
};

#[cfg(feature = "grpc")]
pub use grpc::{GrpcStats, TonicTransport, TonicTransportBuilder};

#[cfg(feature = "rest")]
pub use rest::{HttpTransport, HttpTransportBuilder, RestStats};
