//! The request context envelope threaded through the pipeline.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{Category, LogicalRequest};
use crate::Error;

/// Metadata keys with this prefix are forwarded as wire headers (REST) or
/// call metadata (gRPC). Every other key stays in-process.
pub const HEADER_PREFIX: &str = "header:";

/// Replica acknowledgement level for reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    /// One replica.
    One,
    /// A majority of replicas.
    Quorum,
    /// Every replica.
    All,
}

impl ConsistencyLevel {
    /// Wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::One => "ONE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ONE" => Ok(Self::One),
            "QUORUM" => Ok(Self::Quorum),
            "ALL" => Ok(Self::All),
            _ => Err(Error::invalid_argument(format!("unknown consistency level {:?}", s))),
        }
    }
}

/// String-keyed side channel carried by a [`RequestContext`].
///
/// Metadata has value semantics: cloning it and inserting into the clone
/// never affects the original. Storage is shared until the first write, so
/// carrying it across context overrides is cheap.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Arc<HashMap<String, String>>,
}

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        Arc::make_mut(&mut self.entries).insert(key.into(), value.into())
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        if !self.entries.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut self.entries).remove(key)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert of a header entry (`header:<name>`).
    #[must_use]
    pub fn with_header(self, name: &str, value: impl Into<String>) -> Self {
        self.with(format!("{}{}", HEADER_PREFIX, name), value)
    }

    /// Iterates over header entries with the prefix stripped.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(HEADER_PREFIX).map(|name| (name, v.as_str())))
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: Arc::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()) }
    }
}

/// Field overrides for [`RequestContext::with`].
///
/// Every `None` field means "keep the receiver's value"; the default value
/// overrides nothing.
#[derive(Debug, Clone, Default)]
pub struct ContextOverrides {
    /// Replacement logical request.
    pub request: Option<Arc<dyn LogicalRequest>>,
    /// Replacement cancellation token.
    pub cancellation: Option<CancellationToken>,
    /// Replacement timeout.
    pub timeout: Option<Duration>,
    /// Replacement metadata.
    pub metadata: Option<Metadata>,
    /// Replacement collection.
    pub collection: Option<String>,
    /// Replacement tenant.
    pub tenant: Option<String>,
    /// Replacement consistency level.
    pub consistency_level: Option<ConsistencyLevel>,
}

/// Envelope around a logical request for exactly one pipeline execution.
///
/// A context is never mutated in place. [`RequestContext::with`] is the only
/// way to change it, and it returns a new context; the `with_*` helpers are
/// shorthands for it.
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use weaviate::request::{GetMeta, RequestContext};
///
/// let ctx = RequestContext::new(GetMeta);
/// let ctx2 = ctx.with_timeout(Duration::from_secs(5)).with_metadata("attempt", "1");
///
/// assert_eq!(ctx.timeout(), None);
/// assert_eq!(ctx2.timeout(), Some(Duration::from_secs(5)));
/// assert_eq!(ctx2.metadata().get("attempt"), Some("1"));
/// assert_eq!(ctx2.operation_name(), "GetMeta");
/// ```
#[derive(Clone)]
pub struct RequestContext {
    request: Arc<dyn LogicalRequest>,
    cancellation: CancellationToken,
    timeout: Option<Duration>,
    metadata: Metadata,
    collection: Option<String>,
    tenant: Option<String>,
    consistency_level: Option<ConsistencyLevel>,
}

impl RequestContext {
    /// Wraps a logical request with a fresh cancellation token and no
    /// timeout, metadata or addressing.
    pub fn new(request: impl LogicalRequest) -> Self {
        Self::from_arc(Arc::new(request))
    }

    /// Wraps a shared logical request.
    pub fn from_arc(request: Arc<dyn LogicalRequest>) -> Self {
        Self {
            request,
            cancellation: CancellationToken::new(),
            timeout: None,
            metadata: Metadata::new(),
            collection: None,
            tenant: None,
            consistency_level: None,
        }
    }

    /// Returns a copy of this context with the given overrides applied.
    ///
    /// `ctx.with(ContextOverrides::default())` is equal to `ctx` in every
    /// observable field.
    #[must_use]
    pub fn with(&self, overrides: ContextOverrides) -> Self {
        let ContextOverrides {
            request,
            cancellation,
            timeout,
            metadata,
            collection,
            tenant,
            consistency_level,
        } = overrides;

        Self {
            request: request.unwrap_or_else(|| Arc::clone(&self.request)),
            cancellation: cancellation.unwrap_or_else(|| self.cancellation.clone()),
            timeout: timeout.or(self.timeout),
            metadata: metadata.unwrap_or_else(|| self.metadata.clone()),
            collection: collection.or_else(|| self.collection.clone()),
            tenant: tenant.or_else(|| self.tenant.clone()),
            consistency_level: consistency_level.or(self.consistency_level),
        }
    }

    /// Copy with a different timeout.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with(ContextOverrides { timeout: Some(timeout), ..Default::default() })
    }

    /// Copy with a different cancellation token.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        self.with(ContextOverrides { cancellation: Some(token), ..Default::default() })
    }

    /// Copy with one metadata entry added or replaced.
    #[must_use]
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let metadata = self.metadata.clone().with(key, value);
        self.with(ContextOverrides { metadata: Some(metadata), ..Default::default() })
    }

    /// Copy addressed to a collection.
    #[must_use]
    pub fn with_collection(&self, collection: impl Into<String>) -> Self {
        self.with(ContextOverrides { collection: Some(collection.into()), ..Default::default() })
    }

    /// Copy addressed to a tenant.
    #[must_use]
    pub fn with_tenant(&self, tenant: impl Into<String>) -> Self {
        self.with(ContextOverrides { tenant: Some(tenant.into()), ..Default::default() })
    }

    /// Copy with a consistency level.
    #[must_use]
    pub fn with_consistency_level(&self, level: ConsistencyLevel) -> Self {
        self.with(ContextOverrides { consistency_level: Some(level), ..Default::default() })
    }

    /// The logical request.
    pub fn request(&self) -> &Arc<dyn LogicalRequest> {
        &self.request
    }

    /// Shorthand for `self.request().operation_name()`.
    pub fn operation_name(&self) -> &str {
        self.request.operation_name()
    }

    /// Shorthand for `self.request().category()`.
    pub fn category(&self) -> Category {
        self.request.category()
    }

    /// The cancellation token. Transports observe it; the pipeline does not.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The timeout, if any. Transports enforce it; the pipeline does not.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The metadata side channel.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Target collection.
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Target tenant.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    /// Consistency level.
    pub fn consistency_level(&self) -> Option<ConsistencyLevel> {
        self.consistency_level
    }
}

/// Two contexts are equal when they wrap the same request instance, agree on
/// cancellation state and carry equal values in every other field.
impl PartialEq for RequestContext {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.request), Arc::as_ptr(&other.request))
            && self.cancellation.is_cancelled() == other.cancellation.is_cancelled()
            && self.timeout == other.timeout
            && self.metadata == other.metadata
            && self.collection == other.collection
            && self.tenant == other.tenant
            && self.consistency_level == other.consistency_level
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("operation", &self.operation_name())
            .field("timeout", &self.timeout)
            .field("metadata", &self.metadata)
            .field("collection", &self.collection)
            .field("tenant", &self.tenant)
            .field("consistency_level", &self.consistency_level)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}
