//! Configuration types for the client.
//!
//! This module provides configuration options for:
//! - [`ClientConfig`]: Endpoints, API key and static headers
//! - [`TimeoutConfig`]: Connect, request and health-check timeouts
//! - [`RetryConfig`]: Transport retry behavior for transient failures

mod client;
mod retry;
mod timeout;

pub use client::{
    ClientConfig, DEFAULT_GRPC_ENDPOINT, DEFAULT_REST_ENDPOINT, ENV_API_KEY, ENV_GRPC_URL,
    ENV_REST_URL,
};
pub use retry::RetryConfig;
pub use timeout::TimeoutConfig;
