//! Per-operation latency accounting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::pipeline::{AfterReceive, BeforeSend, Interceptor, OnError, Response};
use crate::request::RequestContext;
use crate::{Error, Result};

/// Metadata key holding the RFC 3339 time a request entered the pipeline.
pub const STARTED_AT_KEY: &str = "timing.started_at";

/// Aggregated timings for one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationTiming {
    /// Successful requests.
    pub count: u64,
    /// Failed requests.
    pub errors: u64,
    /// Sum of successful request latencies.
    pub total: Duration,
    /// Slowest successful request.
    pub max: Duration,
}

impl OperationTiming {
    /// Mean latency of successful requests.
    pub fn average(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total / count,
            Err(_) => Duration::from_nanos(
                u64::try_from(self.total.as_nanos() / u128::from(self.count)).unwrap_or(u64::MAX),
            ),
        }
    }
}

/// Shared, cloneable store of [`OperationTiming`] keyed by operation name.
#[derive(Debug, Clone, Default)]
pub struct TimingStats {
    inner: Arc<RwLock<HashMap<String, OperationTiming>>>,
}

impl TimingStats {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful request.
    pub fn record_success(&self, operation: &str, elapsed: Duration) {
        let mut timings = self.inner.write();
        let entry = timings.entry(operation.to_string()).or_default();
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }

    /// Records a failed request.
    pub fn record_error(&self, operation: &str) {
        self.inner.write().entry(operation.to_string()).or_default().errors += 1;
    }

    /// Timings for one operation.
    pub fn get(&self, operation: &str) -> Option<OperationTiming> {
        self.inner.read().get(operation).copied()
    }

    /// Copy of every operation's timings.
    pub fn snapshot(&self) -> HashMap<String, OperationTiming> {
        self.inner.read().clone()
    }

    /// Clears all timings.
    pub fn reset(&self) {
        self.inner.write().clear();
    }
}

/// Measures how long each operation takes end to end.
///
/// The before-send stage stamps [`STARTED_AT_KEY`] into the metadata; the
/// after-receive stage computes the elapsed time from it. Because error
/// observers see the context the pipeline was called with, failures only
/// increment the error count.
///
/// Register the interceptor first so its stamp precedes the other
/// before-send interceptors and its measurement follows the other
/// after-receive interceptors.
///
/// ## Example
///
/// ```rust
/// use weaviate::interceptors::TimingInterceptor;
/// use weaviate::pipeline::RequestPipeline;
/// use weaviate::request::{GetMeta, RequestContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> weaviate::Result<()> {
/// let timing = TimingInterceptor::new();
/// let stats = timing.stats();
/// let pipeline = RequestPipeline::builder().interceptor(timing).build();
///
/// pipeline.execute_unit(RequestContext::new(GetMeta), |_ctx| async { Ok(()) }).await?;
/// assert_eq!(stats.get("GetMeta").map(|t| t.count), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimingInterceptor {
    stats: TimingStats,
}

impl TimingInterceptor {
    /// Creates an interceptor with its own stats store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an interceptor recording into an existing store.
    pub fn with_stats(stats: TimingStats) -> Self {
        Self { stats }
    }

    /// Handle to the stats store.
    pub fn stats(&self) -> TimingStats {
        self.stats.clone()
    }
}

fn started_at(ctx: &RequestContext) -> Option<DateTime<Utc>> {
    let raw = ctx.metadata().get(STARTED_AT_KEY)?;
    DateTime::parse_from_rfc3339(raw).ok().map(|t| t.with_timezone(&Utc))
}

#[async_trait]
impl BeforeSend for TimingInterceptor {
    async fn before_send(&self, ctx: RequestContext) -> Result<RequestContext> {
        let now = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
        Ok(ctx.with_metadata(STARTED_AT_KEY, now))
    }
}

#[async_trait]
impl AfterReceive for TimingInterceptor {
    async fn after_receive(&self, ctx: &RequestContext, response: Response) -> Result<Response> {
        match started_at(ctx) {
            Some(start) => {
                let elapsed = (Utc::now() - start).to_std().unwrap_or_default();
                self.stats.record_success(ctx.operation_name(), elapsed);
            },
            None => {
                tracing::debug!(operation = %ctx.operation_name(), "no start time in metadata");
            },
        }
        Ok(response)
    }
}

#[async_trait]
impl OnError for TimingInterceptor {
    async fn on_error(&self, ctx: &RequestContext, _error: &Error) -> Result<()> {
        self.stats.record_error(ctx.operation_name());
        Ok(())
    }
}

impl Interceptor for TimingInterceptor {
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
