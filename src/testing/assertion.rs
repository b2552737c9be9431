//! Fluent assertions over captured requests.

use std::fmt;
use std::sync::Arc;

use super::capture::{CapturedRequest, WireRequest};

type Filter<D> = Arc<dyn Fn(&CapturedRequest<D>) -> bool + Send + Sync>;

/// Filters the requests captured by a mock transport and checks how many
/// matched.
///
/// Filters combine with AND. The terminal checks panic with a listing of
/// everything that was captured, so a failing test shows what was sent
/// instead.
///
/// ## Example
///
/// ```rust
/// use weaviate::request::{GetMeta, RequestContext};
/// use weaviate::testing::MockRestTransport;
/// use weaviate::transport::{RestRequestDetails, RestTransport};
///
/// # tokio_test_block_on(async {
/// let mock = MockRestTransport::new();
/// let ctx = RequestContext::new(GetMeta);
/// mock.send(RestRequestDetails::get("/v1/meta").with_context(&ctx), ctx.cancellation_token())
///     .await
///     .unwrap();
///
/// mock.assert_request().for_operation("GetMeta").with_method("GET").was_sent_times(1);
/// mock.assert_request().for_operation("ObjectInsert").was_not_sent();
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct RequestAssertion<D> {
    captured: Vec<CapturedRequest<D>>,
    filters: Vec<Filter<D>>,
    description: Vec<String>,
}

impl<D: WireRequest> RequestAssertion<D> {
    pub(crate) fn new(captured: Vec<CapturedRequest<D>>) -> Self {
        Self { captured, filters: Vec::new(), description: Vec::new() }
    }

    fn filter(
        mut self,
        description: String,
        filter: impl Fn(&CapturedRequest<D>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.description.push(description);
        self.filters.push(Arc::new(filter));
        self
    }

    /// Keeps requests built from a logical request with this operation name.
    #[must_use]
    pub fn for_operation(self, operation: impl AsRef<str>) -> Self {
        let operation = operation.as_ref().to_string();
        self.filter(format!("operation = {}", operation), move |c| {
            c.operation_name() == Some(operation.as_str())
        })
    }

    /// Keeps requests with this HTTP verb (case-insensitive) or gRPC method.
    #[must_use]
    pub fn with_method(self, method: impl Into<String>) -> Self {
        let method = method.into();
        self.filter(format!("method = {}", method), move |c| {
            c.details.method().eq_ignore_ascii_case(&method)
        })
    }

    /// Keeps requests whose path (or gRPC method) contains `fragment`.
    #[must_use]
    pub fn with_target_containing(self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        self.filter(format!("target contains {:?}", fragment), move |c| {
            c.details.target().contains(&fragment)
        })
    }

    /// Keeps requests accepted by a custom predicate.
    #[must_use]
    pub fn matching(
        self,
        predicate: impl Fn(&CapturedRequest<D>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter("custom predicate".to_string(), predicate)
    }

    /// Captured requests passing every filter, in arrival order.
    pub fn matched(&self) -> Vec<&CapturedRequest<D>> {
        self.captured.iter().filter(|c| self.filters.iter().all(|f| f(*c))).collect()
    }

    /// Number of captured requests passing every filter.
    pub fn count(&self) -> usize {
        self.matched().len()
    }

    /// Asserts that at least one captured request matched.
    ///
    /// # Panics
    ///
    /// Panics if nothing matched.
    #[track_caller]
    #[allow(clippy::panic)]
    pub fn was_sent(&self) -> &Self {
        if self.count() == 0 {
            panic!(
                "expected a request matching {}, but none matched\n{}",
                self.criteria(),
                self.listing()
            );
        }
        self
    }

    /// Asserts that exactly `times` captured requests matched.
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    #[track_caller]
    #[allow(clippy::panic)]
    pub fn was_sent_times(&self, times: usize) -> &Self {
        let count = self.count();
        if count != times {
            panic!(
                "expected {} request(s) matching {}, but {} matched\n{}",
                times,
                self.criteria(),
                count,
                self.listing()
            );
        }
        self
    }

    /// Asserts that no captured request matched.
    ///
    /// # Panics
    ///
    /// Panics if anything matched.
    #[track_caller]
    #[allow(clippy::panic)]
    pub fn was_not_sent(&self) -> &Self {
        let count = self.count();
        if count != 0 {
            panic!(
                "expected no request matching {}, but {} matched\n{}",
                self.criteria(),
                count,
                self.listing()
            );
        }
        self
    }

    fn criteria(&self) -> String {
        if self.description.is_empty() {
            "[any]".to_string()
        } else {
            format!("[{}]", self.description.join(", "))
        }
    }

    fn listing(&self) -> String {
        if self.captured.is_empty() {
            return "no requests were captured".to_string();
        }
        let mut out = format!("captured {} request(s):", self.captured.len());
        for captured in &self.captured {
            out.push_str(&format!("\n  #{} {}", captured.sequence, captured.details.describe()));
        }
        out
    }
}

impl<D: WireRequest> fmt::Debug for RequestAssertion<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAssertion")
            .field("criteria", &self.criteria())
            .field("captured", &self.captured.len())
            .finish()
    }
}
