//! Error types for the client.
//!
//! Errors fall into three groups:
//!
//! - **Programming errors** (`InvalidArgument`, `InvalidResponse`): a request
//!   missing a required field, or an interceptor that swapped the response
//!   type. They fail immediately and are never retried.
//! - **Transport failures** (status- or code-derived kinds): surfaced by the
//!   executor and propagated through the pipeline unchanged.
//! - **Observer failures**: errors raised by an error interceptor while it is
//!   being notified. These are logged and dropped; they never reach the caller.

#[allow(clippy::module_inception)]
mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
