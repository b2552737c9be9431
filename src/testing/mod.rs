//! Offline test harness.
//!
//! This module provides in-memory transports so code built on the client can
//! be unit-tested without a running server:
//!
//! - [`MockRestTransport`]: a [`RestTransport`](crate::transport::RestTransport)
//!   double; unmatched requests get an empty `200 OK`
//! - [`MockGrpcTransport`]: a [`GrpcTransport`](crate::transport::GrpcTransport)
//!   double; unmatched calls fail with `Unimplemented`
//! - [`RequestAssertion`]: fluent checks over what was sent
//!
//! Both mocks record every call before answering it, including calls that
//! end in an error, so tests can assert on attempts made under error
//! injection. Each mock owns its state; create a fresh one per test.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use weaviate::Client;
//! use weaviate::request::Operation;
//! use weaviate::testing::{MockGrpcTransport, MockRestTransport};
//! use weaviate::transport::RestResponse;
//!
//! # tokio_test_block_on(async {
//! let rest = MockRestTransport::new();
//! rest.on_operation(Operation::CollectionGet, RestResponse::ok().with_json(&json!({"class": "Articles"})));
//!
//! let client = Client::new(rest.clone(), MockGrpcTransport::new());
//! let collection = client.get_collection("Articles").await.unwrap();
//!
//! assert_eq!(collection.unwrap()["class"], "Articles");
//! rest.assert_request().for_operation("CollectionGet").with_method("GET").was_sent();
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Choosing a Rule
//!
//! | Rule | Matches on | Use when |
//! |------|------------|----------|
//! | `on_operation` | logical operation name | the test cares about intent |
//! | `on_request` / `on_method` | verb + path, or gRPC method | the test cares about the wire |
//! | `when` | any predicate | neither is specific enough |

mod assertion;
mod capture;
mod grpc;
mod rest;

pub use assertion::RequestAssertion;
pub use capture::{CapturedRequest, WireRequest};
pub use grpc::{GrpcCall, MockGrpcTransport};
pub use rest::MockRestTransport;
