//! Closure adapters for one-off interceptors.

use std::fmt;

use async_trait::async_trait;

use crate::pipeline::{AfterReceive, BeforeSend, OnError, Response};
use crate::request::RequestContext;
use crate::{Error, Result};

/// A [`BeforeSend`] backed by a closure. Created by [`before_send_fn`].
pub struct BeforeSendFn<F> {
    f: F,
}

/// A [`AfterReceive`] backed by a closure. Created by [`after_receive_fn`].
pub struct AfterReceiveFn<F> {
    f: F,
}

/// A [`OnError`] backed by a closure. Created by [`on_error_fn`].
pub struct OnErrorFn<F> {
    f: F,
}

/// Adapts a synchronous closure into a before-send interceptor.
///
/// ```rust
/// use weaviate::interceptors::before_send_fn;
///
/// let tag = before_send_fn(|ctx| Ok(ctx.with_metadata("source", "docs")));
/// # let _ = tag;
/// ```
pub fn before_send_fn<F>(f: F) -> BeforeSendFn<F>
where
    F: Fn(RequestContext) -> Result<RequestContext> + Send + Sync + 'static,
{
    BeforeSendFn { f }
}

/// Adapts a synchronous closure into an after-receive interceptor.
pub fn after_receive_fn<F>(f: F) -> AfterReceiveFn<F>
where
    F: Fn(&RequestContext, Response) -> Result<Response> + Send + Sync + 'static,
{
    AfterReceiveFn { f }
}

/// Adapts a synchronous closure into an error observer.
pub fn on_error_fn<F>(f: F) -> OnErrorFn<F>
where
    F: Fn(&RequestContext, &Error) -> Result<()> + Send + Sync + 'static,
{
    OnErrorFn { f }
}

#[async_trait]
impl<F> BeforeSend for BeforeSendFn<F>
where
    F: Fn(RequestContext) -> Result<RequestContext> + Send + Sync + 'static,
{
    async fn before_send(&self, ctx: RequestContext) -> Result<RequestContext> {
        (self.f)(ctx)
    }
}

#[async_trait]
impl<F> AfterReceive for AfterReceiveFn<F>
where
    F: Fn(&RequestContext, Response) -> Result<Response> + Send + Sync + 'static,
{
    async fn after_receive(&self, ctx: &RequestContext, response: Response) -> Result<Response> {
        (self.f)(ctx, response)
    }
}

#[async_trait]
impl<F> OnError for OnErrorFn<F>
where
    F: Fn(&RequestContext, &Error) -> Result<()> + Send + Sync + 'static,
{
    async fn on_error(&self, ctx: &RequestContext, error: &Error) -> Result<()> {
        (self.f)(ctx, error)
    }
}

impl<F> fmt::Debug for BeforeSendFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BeforeSendFn")
    }
}

impl<F> fmt::Debug for AfterReceiveFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AfterReceiveFn")
    }
}

impl<F> fmt::Debug for OnErrorFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnErrorFn")
    }
}
