//! Structured request logging.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::{AfterReceive, BeforeSend, Interceptor, OnError, Response};
use crate::request::RequestContext;
use crate::{Error, Result};

/// Logs every request stage through `tracing`.
///
/// Outgoing requests and responses are logged at `DEBUG`, failures at
/// `WARN`. Every event carries the operation name, category, collection and
/// tenant. Metadata is only logged with
/// [`with_metadata`](Self::with_metadata), since `header:` entries may hold
/// credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor {
    log_metadata: bool,
}

impl LoggingInterceptor {
    /// Creates a logging interceptor that omits metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log non-header metadata entries.
    #[must_use]
    pub fn with_metadata(mut self, log_metadata: bool) -> Self {
        self.log_metadata = log_metadata;
        self
    }

    fn metadata_summary(&self, ctx: &RequestContext) -> Option<String> {
        if !self.log_metadata {
            return None;
        }
        let mut entries: Vec<_> = ctx
            .metadata()
            .iter()
            .filter(|(key, _)| !key.starts_with(crate::request::HEADER_PREFIX))
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        entries.sort();
        Some(entries.join(","))
    }
}

#[async_trait]
impl BeforeSend for LoggingInterceptor {
    async fn before_send(&self, ctx: RequestContext) -> Result<RequestContext> {
        tracing::debug!(
            operation = %ctx.operation_name(),
            category = %ctx.category(),
            collection = ctx.collection(),
            tenant = ctx.tenant(),
            timeout_ms = ctx.timeout().map(|t| t.as_millis() as u64),
            metadata = self.metadata_summary(&ctx),
            "sending request"
        );
        Ok(ctx)
    }
}

#[async_trait]
impl AfterReceive for LoggingInterceptor {
    async fn after_receive(&self, ctx: &RequestContext, response: Response) -> Result<Response> {
        tracing::debug!(
            operation = %ctx.operation_name(),
            category = %ctx.category(),
            collection = ctx.collection(),
            tenant = ctx.tenant(),
            response_type = response.type_name(),
            "received response"
        );
        Ok(response)
    }
}

#[async_trait]
impl OnError for LoggingInterceptor {
    async fn on_error(&self, ctx: &RequestContext, error: &Error) -> Result<()> {
        tracing::warn!(
            operation = %ctx.operation_name(),
            category = %ctx.category(),
            collection = ctx.collection(),
            tenant = ctx.tenant(),
            kind = ?error.kind(),
            status = error.status(),
            error = %error,
            "request failed"
        );
        Ok(())
    }
}

impl Interceptor for LoggingInterceptor {
    fn as_before_send(self: Arc<Self>) -> Option<Arc<dyn BeforeSend>> {
        Some(self)
    }

    fn as_after_receive(self: Arc<Self>) -> Option<Arc<dyn AfterReceive>> {
        Some(self)
    }

    fn as_on_error(self: Arc<Self>) -> Option<Arc<dyn OnError>> {
        Some(self)
    }
}
