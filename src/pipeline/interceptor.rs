//! Interceptor capabilities.
//!
//! An interceptor implements any subset of three independent capabilities:
//!
//! | Capability       | Called                         | May                                  |
//! |------------------|--------------------------------|--------------------------------------|
//! | [`BeforeSend`]   | before the executor, in order  | rewrite the context, or reject       |
//! | [`AfterReceive`] | after success, in reverse order| transform the response, or reject    |
//! | [`OnError`]      | after any failure, in order    | observe only                         |
//!
//! Each capability is registered in its own list on the
//! [`RequestPipeline`](super::RequestPipeline). A type implementing several
//! of them can be registered once through [`Interceptor`].

use std::sync::Arc;

use async_trait::async_trait;

use super::Response;
use crate::request::RequestContext;
use crate::{Error, Result};

// ============================================================================
// Capabilities
// ============================================================================

/// Runs before the executor.
///
/// Returns the context the next interceptor (and finally the executor) sees.
/// Returning an error rejects the request: no further before-send
/// interceptor, no executor and no after-receive interceptor runs.
#[async_trait]
pub trait BeforeSend: Send + Sync + 'static {
    /// Rewrites or rejects the outgoing request.
    async fn before_send(&self, ctx: RequestContext) -> Result<RequestContext>;
}

/// Runs after a successful executor call.
///
/// `ctx` is the context the executor was invoked with.
#[async_trait]
pub trait AfterReceive: Send + Sync + 'static {
    /// Transforms or rejects the response.
    async fn after_receive(&self, ctx: &RequestContext, response: Response) -> Result<Response>;
}

/// Observes a failure anywhere in the pipeline.
///
/// `ctx` is the context the pipeline was invoked with, before any
/// before-send interceptor ran. Errors and panics raised here are logged and
/// swallowed; they never replace the error returned to the caller.
#[async_trait]
pub trait OnError: Send + Sync + 'static {
    /// Observes the error.
    async fn on_error(&self, ctx: &RequestContext, error: &Error) -> Result<()>;
}

// ============================================================================
// Combined registration
// ============================================================================

/// A type implementing one or more capabilities, registered in one call.
///
/// Override the accessor of every capability the type implements; the
/// defaults opt out.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use async_trait::async_trait;
/// use weaviate::pipeline::{BeforeSend, Interceptor, OnError, RequestPipeline};
/// use weaviate::request::RequestContext;
/// use weaviate::{Error, Result};
///
/// struct Audit;
///
/// #[async_trait]
/// impl BeforeSend for Audit {
///     async fn before_send(&self, ctx: RequestContext) -> Result<RequestContext> {
///         Ok(ctx.with_metadata("audited", "true"))
///     }
/// }
///
/// #[async_trait]
/// impl OnError for Audit {
///     async fn on_error(&self, _ctx: &RequestContext, _error: &Error) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// impl Interceptor for Audit {
///     fn as_before_send(self: Arc<Self>) -> Option<Arc<dyn BeforeSend>> {
///         Some(self)
///     }
///
///     fn as_on_error(self: Arc<Self>) -> Option<Arc<dyn OnError>> {
///         Some(self)
///     }
/// }
///
/// let pipeline = RequestPipeline::builder().interceptor(Audit).build();
/// assert_eq!(pipeline.before_send_count(), 1);
/// assert_eq!(pipeline.after_receive_count(), 0);
/// assert_eq!(pipeline.on_error_count(), 1);
/// ```
pub trait Interceptor: Send + Sync + 'static {
    /// The before-send capability, if implemented.
    fn as_before_send(self: Arc<Self>) -> Option<Arc<dyn BeforeSend>> {
        None
    }

    /// The after-receive capability, if implemented.
    fn as_after_receive(self: Arc<Self>) -> Option<Arc<dyn AfterReceive>> {
        None
    }

    /// The on-error capability, if implemented.
    fn as_on_error(self: Arc<Self>) -> Option<Arc<dyn OnError>> {
        None
    }
}
