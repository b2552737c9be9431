//! The request orchestrator.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::Instrument;

use super::{AfterReceive, BeforeSend, Interceptor, OnError, Response};
use crate::request::RequestContext;
use crate::{Error, Result};

/// Runs interceptors around a caller-supplied executor.
///
/// One invocation moves through four stages:
///
/// 1. **Before send**: every [`BeforeSend`] interceptor, in registration
///    order, each receiving the context returned by the previous one.
/// 2. **Execute**: the executor, exactly once, with the final context.
/// 3. **After receive**: on success, every [`AfterReceive`] interceptor in
///    *reverse* registration order, each receiving the previous response.
/// 4. **Error**: on any failure in stages 1-3, every [`OnError`] interceptor
///    in registration order with the original context. The error is then
///    returned to the caller unchanged.
///
/// The pipeline never retries and never enforces the context's timeout or
/// cancellation token; the executor (usually a transport) does.
///
/// Interceptors are registered through `&mut self` methods or a
/// [`PipelineBuilder`], so a pipeline cannot change while it is shared with
/// in-flight requests. Clone it to derive a differently configured copy.
///
/// ## Example
///
/// ```rust
/// use weaviate::interceptors::{after_receive_fn, before_send_fn};
/// use weaviate::pipeline::RequestPipeline;
/// use weaviate::request::{GetMeta, RequestContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> weaviate::Result<()> {
/// let pipeline = RequestPipeline::builder()
///     .before_send(before_send_fn(|ctx| Ok(ctx.with_metadata("X-Test", "1"))))
///     .after_receive(after_receive_fn(|_ctx, response| Ok(response)))
///     .build();
///
/// let body = pipeline
///     .execute(RequestContext::new(GetMeta), |ctx| async move {
///         assert_eq!(ctx.metadata().get("X-Test"), Some("1"));
///         Ok(String::from("ok"))
///     })
///     .await?;
/// assert_eq!(body, "ok");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct RequestPipeline {
    before_send: Vec<Arc<dyn BeforeSend>>,
    after_receive: Vec<Arc<dyn AfterReceive>>,
    on_error: Vec<Arc<dyn OnError>>,
}

impl RequestPipeline {
    /// Creates a pipeline with no interceptors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Registers a before-send interceptor.
    pub fn add_before_send(&mut self, interceptor: impl BeforeSend) -> &mut Self {
        self.before_send.push(Arc::new(interceptor));
        self
    }

    /// Registers an after-receive interceptor.
    pub fn add_after_receive(&mut self, interceptor: impl AfterReceive) -> &mut Self {
        self.after_receive.push(Arc::new(interceptor));
        self
    }

    /// Registers an error observer.
    pub fn add_on_error(&mut self, interceptor: impl OnError) -> &mut Self {
        self.on_error.push(Arc::new(interceptor));
        self
    }

    /// Registers every capability `interceptor` exposes through
    /// [`Interceptor`].
    pub fn add(&mut self, interceptor: impl Interceptor) -> &mut Self {
        self.add_shared(Arc::new(interceptor))
    }

    /// Like [`add`](Self::add), keeping a handle to the interceptor.
    pub fn add_shared<I: Interceptor>(&mut self, interceptor: Arc<I>) -> &mut Self {
        if let Some(hook) = Arc::clone(&interceptor).as_before_send() {
            self.before_send.push(hook);
        }
        if let Some(hook) = Arc::clone(&interceptor).as_after_receive() {
            self.after_receive.push(hook);
        }
        if let Some(hook) = interceptor.as_on_error() {
            self.on_error.push(hook);
        }
        self
    }

    /// Number of before-send interceptors.
    pub fn before_send_count(&self) -> usize {
        self.before_send.len()
    }

    /// Number of after-receive interceptors.
    pub fn after_receive_count(&self) -> usize {
        self.after_receive.len()
    }

    /// Number of error observers.
    pub fn on_error_count(&self) -> usize {
        self.on_error.len()
    }

    /// Returns `true` if no interceptor of any kind is registered.
    pub fn is_empty(&self) -> bool {
        self.before_send.is_empty() && self.after_receive.is_empty() && self.on_error.is_empty()
    }

    /// Runs one request through the pipeline.
    ///
    /// `executor` is called exactly once unless a before-send interceptor
    /// rejects the request, in which case it is not called at all.
    ///
    /// If after-receive interceptors replace the response with a value that
    /// is not a `T`, the invocation fails with
    /// [`ErrorKind::InvalidResponse`](crate::ErrorKind::InvalidResponse)
    /// and the error observers are notified.
    pub async fn execute<T, F, Fut>(&self, ctx: RequestContext, executor: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let span = tracing::debug_span!(
            "request",
            operation = %ctx.operation_name(),
            category = %ctx.category(),
        );
        self.run(ctx, executor).instrument(span).await
    }

    /// Runs an operation that produces no value.
    pub async fn execute_unit<F, Fut>(&self, ctx: RequestContext, executor: F) -> Result<()>
    where
        F: FnOnce(RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        self.execute::<(), _, _>(ctx, executor).await
    }

    async fn run<T, F, Fut>(&self, ctx: RequestContext, executor: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let original = ctx.clone();
        match self.run_stages(ctx, executor).await {
            Ok(value) => {
                tracing::trace!("request completed");
                Ok(value)
            },
            Err(error) => {
                tracing::debug!(error = %error, "request failed");
                self.notify_error(&original, &error).await;
                Err(error)
            },
        }
    }

    async fn run_stages<T, F, Fut>(&self, mut ctx: RequestContext, executor: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(RequestContext) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        for interceptor in &self.before_send {
            ctx = interceptor.before_send(ctx).await?;
        }

        tracing::trace!(interceptors = self.before_send.len(), "before-send complete");
        let value = executor(ctx.clone()).await?;

        if self.after_receive.is_empty() {
            return Ok(value);
        }

        let mut response = Response::new(value);
        for interceptor in self.after_receive.iter().rev() {
            response = interceptor.after_receive(&ctx, response).await?;
        }

        response.into_inner::<T>().map_err(|response| {
            Error::invalid_response(format!(
                "after-receive interceptors returned {} where {} was expected",
                response.type_name(),
                type_name::<T>()
            ))
        })
    }

    async fn notify_error(&self, ctx: &RequestContext, error: &Error) {
        for observer in &self.on_error {
            match AssertUnwindSafe(observer.on_error(ctx, error)).catch_unwind().await {
                Ok(Ok(())) => {},
                Ok(Err(observer_error)) => {
                    tracing::warn!(
                        observer_error = %observer_error,
                        error = %error,
                        "error interceptor failed"
                    );
                },
                Err(payload) => {
                    tracing::warn!(
                        panic = panic_message(payload.as_ref()),
                        error = %error,
                        "error interceptor panicked"
                    );
                },
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

impl fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("before_send", &self.before_send.len())
            .field("after_receive", &self.after_receive.len())
            .field("on_error", &self.on_error.len())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`RequestPipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    pipeline: RequestPipeline,
}

impl PipelineBuilder {
    /// Adds a before-send interceptor.
    #[must_use]
    pub fn before_send(mut self, interceptor: impl BeforeSend) -> Self {
        self.pipeline.add_before_send(interceptor);
        self
    }

    /// Adds an after-receive interceptor.
    #[must_use]
    pub fn after_receive(mut self, interceptor: impl AfterReceive) -> Self {
        self.pipeline.add_after_receive(interceptor);
        self
    }

    /// Adds an error observer.
    #[must_use]
    pub fn on_error(mut self, interceptor: impl OnError) -> Self {
        self.pipeline.add_on_error(interceptor);
        self
    }

    /// Adds every capability of a multi-capability interceptor.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.pipeline.add(interceptor);
        self
    }

    /// Adds a shared multi-capability interceptor.
    #[must_use]
    pub fn shared<I: Interceptor>(mut self, interceptor: Arc<I>) -> Self {
        self.pipeline.add_shared(interceptor);
        self
    }

    /// Finishes the pipeline.
    pub fn build(self) -> RequestPipeline {
        self.pipeline
    }
}
