//! In-memory gRPC transport.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::assertion::RequestAssertion;
use super::capture::{CapturedRequest, MockCore, WireRequest};
use crate::request::LogicalRequest;
use crate::transport::{GrpcRequestDetails, GrpcTransport};
use crate::{Error, ErrorKind, Result};

type AnyResponse = Box<dyn Any + Send>;

/// A unary call received by [`MockGrpcTransport`]: the details plus the
/// typed request message.
#[derive(Clone)]
pub struct GrpcCall {
    /// Method path, metadata and deadline.
    pub details: GrpcRequestDetails,
    message: Arc<dyn Any + Send + Sync>,
    message_type: &'static str,
}

impl GrpcCall {
    /// The request message, if it has type `T`.
    pub fn message<T: 'static>(&self) -> Option<&T> {
        self.message.downcast_ref::<T>()
    }

    /// Type name of the request message.
    pub fn message_type(&self) -> &'static str {
        self.message_type
    }
}

impl fmt::Debug for GrpcCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcCall")
            .field("details", &self.details)
            .field("message_type", &self.message_type)
            .finish()
    }
}

impl WireRequest for GrpcCall {
    fn method(&self) -> &str {
        self.details.method()
    }

    fn target(&self) -> &str {
        self.details.target()
    }

    fn logical_request(&self) -> Option<&Arc<dyn LogicalRequest>> {
        self.details.logical_request()
    }

    fn describe(&self) -> String {
        self.details.describe()
    }
}

/// A [`GrpcTransport`] that records every call and answers from configured
/// rules.
///
/// Resolution order: the first matching rule, then the default factory,
/// then an [`ErrorKind::Unimplemented`] failure. An unstubbed RPC is treated
/// as a mistake in the test setup rather than answered with an empty
/// message.
///
/// `is_healthy` reports the flag set with [`set_healthy`](Self::set_healthy)
/// (healthy by default) and is not captured.
///
/// ## Example
///
/// ```rust
/// use weaviate::testing::MockGrpcTransport;
/// use weaviate::transport::{HEALTH_CHECK_METHOD, HealthCheckResponse, ServingStatus};
///
/// let mock = MockGrpcTransport::new();
/// mock.on_method(HEALTH_CHECK_METHOD, HealthCheckResponse::with_status(ServingStatus::Serving));
/// mock.set_healthy(false);
/// ```
pub struct MockGrpcTransport {
    core: Arc<MockCore<GrpcCall, AnyResponse>>,
    healthy: Arc<AtomicBool>,
}

impl Clone for MockGrpcTransport {
    fn clone(&self) -> Self {
        Self { core: Arc::clone(&self.core), healthy: Arc::clone(&self.healthy) }
    }
}

impl Default for MockGrpcTransport {
    fn default() -> Self {
        Self { core: Arc::default(), healthy: Arc::new(AtomicBool::new(true)) }
    }
}

impl fmt::Debug for MockGrpcTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockGrpcTransport")
            .field("captured", &self.core.captured_len())
            .field("healthy", &self.healthy.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockGrpcTransport {
    /// Creates a healthy transport with no rules and no captured calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule answering matching calls from `respond`.
    ///
    /// The response type must be the `Resp` the caller asks for, otherwise
    /// the call fails with [`ErrorKind::InvalidResponse`].
    pub fn when<Resp: Send + 'static>(
        &self,
        matcher: impl Fn(&GrpcCall) -> bool + Send + Sync + 'static,
        respond: impl Fn(&GrpcCall) -> Result<Resp> + Send + Sync + 'static,
    ) -> &Self {
        self.core.add_rule(matcher, move |call| respond(call).map(|r| Box::new(r) as AnyResponse));
        self
    }

    /// Answers calls to `method` with a copy of `response`.
    pub fn on_method<Resp>(&self, method: impl Into<String>, response: Resp) -> &Self
    where
        Resp: Clone + Send + Sync + 'static,
    {
        let method = method.into();
        self.when(move |call| call.details.method == method, move |_| Ok(response.clone()))
    }

    /// Answers calls for `operation` with a copy of `response`.
    pub fn on_operation<Resp>(&self, operation: impl AsRef<str>, response: Resp) -> &Self
    where
        Resp: Clone + Send + Sync + 'static,
    {
        let operation = operation.as_ref().to_string();
        self.when(
            move |call| call.operation_name() == Some(operation.as_str()),
            move |_| Ok(response.clone()),
        )
    }

    /// Fails calls to `method` with an error of `kind`.
    pub fn fail_method(
        &self,
        method: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> &Self {
        let method = method.into();
        let message = message.into();
        self.core.add_rule(
            move |call| call.details.method == method,
            move |_| Err(Error::new(kind, message.clone())),
        );
        self
    }

    /// Sets the factory used when no rule matches.
    pub fn set_default<Resp: Send + 'static>(
        &self,
        respond: impl Fn(&GrpcCall) -> Result<Resp> + Send + Sync + 'static,
    ) -> &Self {
        self.core.set_default(move |call| respond(call).map(|r| Box::new(r) as AnyResponse));
        self
    }

    /// Sets what [`GrpcTransport::is_healthy`] reports.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Every call received so far, in arrival order.
    pub fn captured(&self) -> Vec<CapturedRequest<GrpcCall>> {
        self.core.captured()
    }

    /// Number of calls received so far.
    pub fn request_count(&self) -> usize {
        self.core.captured_len()
    }

    /// Starts an assertion over the calls captured so far.
    pub fn assert_request(&self) -> RequestAssertion<GrpcCall> {
        RequestAssertion::new(self.core.captured())
    }

    /// Forgets captured calls, keeping rules.
    pub fn clear(&self) {
        self.core.clear();
    }

    /// Forgets captured calls, rules and the default factory, and reports
    /// healthy again.
    pub fn reset(&self) {
        self.core.reset();
        self.set_healthy(true);
    }
}

#[async_trait]
impl GrpcTransport for MockGrpcTransport {
    async fn unary_call<Req, Resp>(
        &self,
        details: GrpcRequestDetails,
        message: Req,
        token: &CancellationToken,
    ) -> Result<Resp>
    where
        Req: prost::Message + Clone + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let method = details.method.clone();
        let call =
            GrpcCall { details, message: Arc::new(message), message_type: type_name::<Req>() };

        let response = match self.core.resolve(call, token) {
            Some(result) => result?,
            None => {
                return Err(Error::unimplemented(format!(
                    "no mock response configured for {}",
                    method
                )));
            },
        };

        response.downcast::<Resp>().map(|r| *r).map_err(|_| {
            Error::invalid_response(format!(
                "mock response for {} is not a {}",
                method,
                type_name::<Resp>()
            ))
        })
    }

    async fn is_healthy(&self, token: &CancellationToken) -> bool {
        !token.is_cancelled() && self.healthy.load(Ordering::SeqCst)
    }
}
