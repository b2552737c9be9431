//! Capture and rule resolution shared by both mock transports.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::request::LogicalRequest;
use crate::transport::{GrpcRequestDetails, RestRequestDetails};
use crate::{Error, Result};

/// Wire-level view of a captured request, used for matching and assertions.
pub trait WireRequest: Clone + Send + Sync + 'static {
    /// HTTP verb, or the full gRPC method path.
    fn method(&self) -> &str;

    /// Request path and query, or the full gRPC method path.
    fn target(&self) -> &str;

    /// The logical request the call was built from.
    fn logical_request(&self) -> Option<&Arc<dyn LogicalRequest>>;

    /// Operation name of the logical request, if attached.
    fn operation_name(&self) -> Option<&str> {
        self.logical_request().map(|r| r.operation_name())
    }

    /// One-line summary for assertion failures.
    fn describe(&self) -> String {
        match self.operation_name() {
            Some(op) => format!("{} {} ({})", self.method(), self.target(), op),
            None => format!("{} {}", self.method(), self.target()),
        }
    }
}

impl WireRequest for RestRequestDetails {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn target(&self) -> &str {
        &self.path
    }

    fn logical_request(&self) -> Option<&Arc<dyn LogicalRequest>> {
        self.request.as_ref()
    }
}

impl WireRequest for GrpcRequestDetails {
    fn method(&self) -> &str {
        &self.method
    }

    fn target(&self) -> &str {
        &self.method
    }

    fn logical_request(&self) -> Option<&Arc<dyn LogicalRequest>> {
        self.request.as_ref()
    }

    fn describe(&self) -> String {
        match self.operation_name() {
            Some(op) => format!("{} ({})", self.method, op),
            None => self.method.clone(),
        }
    }
}

/// A request recorded by a mock transport.
#[derive(Clone)]
pub struct CapturedRequest<D> {
    /// The wire-level request.
    pub details: D,
    /// When the call arrived.
    pub timestamp: DateTime<Utc>,
    /// Zero-based arrival order within the transport.
    pub sequence: u64,
}

impl<D: WireRequest> CapturedRequest<D> {
    /// The logical request the call was built from.
    pub fn request(&self) -> Option<&Arc<dyn LogicalRequest>> {
        self.details.logical_request()
    }

    /// Operation name of the logical request, if attached.
    pub fn operation_name(&self) -> Option<&str> {
        self.details.operation_name()
    }
}

impl<D: WireRequest> fmt::Debug for CapturedRequest<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedRequest")
            .field("request", &self.details.describe())
            .field("timestamp", &self.timestamp)
            .field("sequence", &self.sequence)
            .finish()
    }
}

pub(crate) type Matcher<D> = Arc<dyn Fn(&D) -> bool + Send + Sync>;
pub(crate) type Responder<D, R> = Arc<dyn Fn(&D) -> Result<R> + Send + Sync>;

/// A matcher paired with a response factory.
pub(crate) struct ResponseRule<D, R> {
    matcher: Matcher<D>,
    respond: Responder<D, R>,
}

impl<D, R> Clone for ResponseRule<D, R> {
    fn clone(&self) -> Self {
        Self { matcher: Arc::clone(&self.matcher), respond: Arc::clone(&self.respond) }
    }
}

struct State<D, R> {
    rules: Vec<ResponseRule<D, R>>,
    default: Option<Responder<D, R>>,
    captured: Vec<CapturedRequest<D>>,
    next_sequence: u64,
}

/// Per-instance capture list, rule list and default response.
///
/// Rule factories run outside the lock, so a factory may inspect the
/// transport that owns it.
pub(crate) struct MockCore<D, R> {
    state: Mutex<State<D, R>>,
}

impl<D, R> Default for MockCore<D, R> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                rules: Vec::new(),
                default: None,
                captured: Vec::new(),
                next_sequence: 0,
            }),
        }
    }
}

impl<D: WireRequest, R> MockCore<D, R> {
    pub(crate) fn add_rule(
        &self,
        matcher: impl Fn(&D) -> bool + Send + Sync + 'static,
        respond: impl Fn(&D) -> Result<R> + Send + Sync + 'static,
    ) {
        self.state
            .lock()
            .rules
            .push(ResponseRule { matcher: Arc::new(matcher), respond: Arc::new(respond) });
    }

    pub(crate) fn set_default(&self, respond: impl Fn(&D) -> Result<R> + Send + Sync + 'static) {
        self.state.lock().default = Some(Arc::new(respond));
    }

    /// Captures `details`, then answers from the first matching rule or the
    /// default factory. `None` means the caller applies its fallback.
    /// A cancelled token short-circuits to [`Error::cancelled`] after capture.
    pub(crate) fn resolve(&self, details: D, token: &CancellationToken) -> Option<Result<R>> {
        let (rules, default) = {
            let mut state = self.state.lock();
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            state.captured.push(CapturedRequest {
                details: details.clone(),
                timestamp: Utc::now(),
                sequence,
            });
            (state.rules.clone(), state.default.clone())
        };

        if token.is_cancelled() {
            return Some(Err(Error::cancelled()));
        }

        if let Some(rule) = rules.iter().find(|rule| (rule.matcher)(&details)) {
            return Some((rule.respond)(&details));
        }
        default.map(|respond| respond(&details))
    }

    pub(crate) fn captured(&self) -> Vec<CapturedRequest<D>> {
        self.state.lock().captured.clone()
    }

    pub(crate) fn captured_len(&self) -> usize {
        self.state.lock().captured.len()
    }

    pub(crate) fn clear(&self) {
        let mut state = self.state.lock();
        state.captured.clear();
        state.next_sequence = 0;
    }

    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        state.rules.clear();
        state.default = None;
        state.captured.clear();
        state.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::GetMeta;
    use crate::transport::HttpMethod;

    fn details(path: &str) -> RestRequestDetails {
        RestRequestDetails::get(path)
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let core = MockCore::<RestRequestDetails, u32>::default();
        core.add_rule(|d| d.path.contains("meta"), |_| Ok(1));
        core.add_rule(|d| d.path.contains("meta"), |_| Ok(2));
        core.set_default(|_| Ok(9));

        let token = CancellationToken::new();
        assert_eq!(core.resolve(details("/v1/meta"), &token).unwrap().unwrap(), 1);
        assert_eq!(core.resolve(details("/v1/schema"), &token).unwrap().unwrap(), 9);
    }

    #[test]
    fn test_unmatched_without_default_is_none() {
        let core = MockCore::<RestRequestDetails, u32>::default();
        assert!(core.resolve(details("/v1/meta"), &CancellationToken::new()).is_none());
        assert_eq!(core.captured_len(), 1);
    }

    #[test]
    fn test_capture_happens_before_cancellation() {
        let core = MockCore::<RestRequestDetails, u32>::default();
        core.add_rule(|_| true, |_| Ok(1));
        let token = CancellationToken::new();
        token.cancel();

        let err = core.resolve(details("/v1/meta"), &token).unwrap().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Cancelled);
        assert_eq!(core.captured_len(), 1);
    }

    #[test]
    fn test_sequence_and_clear() {
        let core = MockCore::<RestRequestDetails, u32>::default();
        let token = CancellationToken::new();
        for path in ["/a", "/b", "/c"] {
            core.resolve(details(path), &token);
        }
        let captured = core.captured();
        assert_eq!(captured.iter().map(|c| c.sequence).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(captured[2].details.path, "/c");

        core.clear();
        assert_eq!(core.captured_len(), 0);
        core.resolve(details("/d"), &token);
        assert_eq!(core.captured()[0].sequence, 0);
    }

    #[test]
    fn test_reset_drops_rules() {
        let core = MockCore::<RestRequestDetails, u32>::default();
        core.add_rule(|_| true, |_| Ok(1));
        core.reset();
        assert!(core.resolve(details("/a"), &CancellationToken::new()).is_none());
    }

    #[test]
    fn test_describe() {
        let with_op = RestRequestDetails::new(HttpMethod::Get, "/v1/meta")
            .logical_request(Arc::new(GetMeta));
        assert_eq!(with_op.describe(), "GET /v1/meta (GetMeta)");
        assert_eq!(details("/x").describe(), "GET /x");
        assert_eq!(GrpcRequestDetails::new("/a.B/C").describe(), "/a.B/C");
    }
}
