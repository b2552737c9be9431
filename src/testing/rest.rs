//! In-memory REST transport.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::assertion::RequestAssertion;
use super::capture::{CapturedRequest, MockCore};
use crate::transport::{HttpMethod, RestRequestDetails, RestResponse, RestTransport};
use crate::{Error, ErrorKind, Result};

/// A [`RestTransport`] that records every request and answers from
/// configured rules.
///
/// Resolution order: the first rule whose matcher accepts the request, then
/// the default factory, then an empty `200 OK`. Unstubbed reads are
/// tolerated so tests only stub what they assert on.
///
/// A request whose cancellation token is already cancelled is captured and
/// then fails with [`ErrorKind::Cancelled`] before any rule or fallback is
/// consulted, the same way a real transport would abort it.
///
/// Clones share state, so a clone can be handed to a
/// [`Client`](crate::Client) while the test keeps another for assertions.
///
/// ## Example
///
/// ```rust
/// use serde_json::json;
/// use weaviate::request::Operation;
/// use weaviate::testing::MockRestTransport;
/// use weaviate::transport::RestResponse;
///
/// let mock = MockRestTransport::new();
/// mock.on_operation(Operation::CollectionCreate, RestResponse::ok().with_json(&json!({"name": "Articles"})))
///     .on_request(weaviate::transport::HttpMethod::Get, "/v1/meta", RestResponse::ok());
/// assert_eq!(mock.request_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockRestTransport {
    core: Arc<MockCore<RestRequestDetails, RestResponse>>,
}

impl std::fmt::Debug for MockRestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRestTransport").field("captured", &self.core.captured_len()).finish()
    }
}

impl MockRestTransport {
    /// Creates a transport with no rules and no captured requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule answering matching requests from `respond`.
    pub fn when(
        &self,
        matcher: impl Fn(&RestRequestDetails) -> bool + Send + Sync + 'static,
        respond: impl Fn(&RestRequestDetails) -> Result<RestResponse> + Send + Sync + 'static,
    ) -> &Self {
        self.core.add_rule(matcher, respond);
        self
    }

    /// Answers requests for `operation` with a copy of `response`.
    pub fn on_operation(&self, operation: impl AsRef<str>, response: RestResponse) -> &Self {
        let operation = operation.as_ref().to_string();
        self.when(
            move |d| d.operation_name() == Some(operation.as_str()),
            move |_| Ok(response.clone()),
        )
    }

    /// Answers requests with this verb whose path contains `path` with a copy
    /// of `response`.
    pub fn on_request(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        response: RestResponse,
    ) -> &Self {
        let path = path.into();
        self.when(
            move |d| d.method == method && d.path.contains(&path),
            move |_| Ok(response.clone()),
        )
    }

    /// Answers requests for `operation` with `status` and a JSON body.
    pub fn on_operation_json(&self, operation: impl AsRef<str>, status: u16, body: Value) -> &Self {
        self.on_operation(operation, RestResponse::new(status).with_json(&body))
    }

    /// Fails requests for `operation` with a transport-level error.
    pub fn fail_operation(
        &self,
        operation: impl AsRef<str>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> &Self {
        let operation = operation.as_ref().to_string();
        let message = message.into();
        self.when(
            move |d| d.operation_name() == Some(operation.as_str()),
            move |_| Err(Error::new(kind, message.clone())),
        )
    }

    /// Sets the factory used when no rule matches.
    pub fn set_default(
        &self,
        respond: impl Fn(&RestRequestDetails) -> Result<RestResponse> + Send + Sync + 'static,
    ) -> &Self {
        self.core.set_default(respond);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn captured(&self) -> Vec<CapturedRequest<RestRequestDetails>> {
        self.core.captured()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.core.captured_len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CapturedRequest<RestRequestDetails>> {
        self.core.captured().pop()
    }

    /// Starts an assertion over the requests captured so far.
    pub fn assert_request(&self) -> RequestAssertion<RestRequestDetails> {
        RequestAssertion::new(self.core.captured())
    }

    /// Forgets captured requests, keeping rules.
    pub fn clear(&self) {
        self.core.clear();
    }

    /// Forgets captured requests, rules and the default factory.
    pub fn reset(&self) {
        self.core.reset();
    }
}

#[async_trait]
impl RestTransport for MockRestTransport {
    async fn send(
        &self,
        details: RestRequestDetails,
        token: &CancellationToken,
    ) -> Result<RestResponse> {
        match self.core.resolve(details, token) {
            Some(result) => result,
            None => Ok(RestResponse::ok()),
        }
    }
}
