//! Transport trait definitions and common types.
//!
//! The two wire models are kept apart:
//!
//! - [`RestTransport`]: verb + path + headers + body, answered by a raw
//!   [`RestResponse`]
//! - [`GrpcTransport`]: typed unary call over a named method
//!
//! Both detail types carry an optional back-reference to the
//! [`LogicalRequest`] they were built from, so interceptors and tests can
//! correlate wire activity with intent.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::decode;
use crate::request::{LogicalRequest, RequestContext};
use crate::{Error, Result};

// ============================================================================
// HTTP Method
// ============================================================================

/// HTTP verb of a REST request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
}

impl HttpMethod {
    /// Upper-case verb.
    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// REST Request / Response
// ============================================================================

/// Everything a [`RestTransport`] needs to send one request.
///
/// `path` is relative to the transport's base URL and may carry a query
/// string.
///
/// ## Example
///
/// ```rust
/// use weaviate::request::{CollectionGet, RequestContext};
/// use weaviate::transport::{HttpMethod, RestRequestDetails};
///
/// let ctx = RequestContext::new(CollectionGet { name: "Articles".into() })
///     .with_metadata("header:X-Trace", "abc");
/// let details = RestRequestDetails::get("/v1/schema/Articles")
///     .query("consistency_level", "QUORUM")
///     .with_context(&ctx);
///
/// assert_eq!(details.method, HttpMethod::Get);
/// assert_eq!(details.path, "/v1/schema/Articles?consistency_level=QUORUM");
/// assert_eq!(details.headers["X-Trace"], "abc");
/// assert_eq!(details.operation_name(), Some("CollectionGet"));
/// ```
#[derive(Clone)]
pub struct RestRequestDetails {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path (and query) relative to the base URL.
    pub path: String,
    /// Per-request headers, merged over the transport's defaults.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Bytes>,
    /// Per-request timeout, overriding the transport default.
    pub timeout: Option<Duration>,
    /// The logical request this was built from.
    pub request: Option<Arc<dyn LogicalRequest>>,
}

impl RestRequestDetails {
    /// Creates details with no headers, body or timeout.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
            request: None,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// `PUT path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// `PATCH path`.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets a JSON body and the matching `Content-Type`.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        self.headers.insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Appends a percent-encoded query parameter.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        let separator = if self.path.contains('?') { '&' } else { '?' };
        self.path.push(separator);
        self.path.push_str(&urlencoding::encode(name));
        self.path.push('=');
        self.path.push_str(&urlencoding::encode(value));
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the logical request back-reference.
    #[must_use]
    pub fn logical_request(mut self, request: Arc<dyn LogicalRequest>) -> Self {
        self.request = Some(request);
        self
    }

    /// Copies the logical request, timeout and `header:` metadata of a
    /// context. Headers already set on the details win.
    #[must_use]
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.request = Some(Arc::clone(ctx.request()));
        if let Some(timeout) = ctx.timeout() {
            self.timeout = Some(timeout);
        }
        for (name, value) in ctx.metadata().headers() {
            self.headers.entry(name.to_string()).or_insert_with(|| value.to_string());
        }
        self
    }

    /// Operation name of the logical request, if attached.
    pub fn operation_name(&self) -> Option<&str> {
        self.request.as_deref().map(|r| r.operation_name())
    }

    /// The body as UTF-8, if present and valid.
    pub fn body_str(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Decodes the JSON body.
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.body.as_deref().unwrap_or_default();
        Ok(serde_json::from_slice(body)?)
    }
}

impl fmt::Debug for RestRequestDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestRequestDetails")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("timeout", &self.timeout)
            .field("operation", &self.operation_name())
            .finish()
    }
}

/// Raw response of a [`RestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lower-cased.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl RestResponse {
    /// An empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self { status, headers: HashMap::new(), body: Bytes::new() }
    }

    /// An empty `200 OK`.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Sets a raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: &Value) -> Self {
        self.body = Bytes::from(body.to_string());
        self.headers.insert("content-type".to_string(), "application/json".to_string());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks a header up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns `true` if the body is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Converts a non-success status into an [`Error`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let mut error = Error::from_http_response(self.status, &self.text());
        if let Some(id) = self.header("x-request-id") {
            error = error.with_request_id(id);
        }
        Err(error)
    }

    /// Decodes the body.
    ///
    /// Fails on a non-success status. An empty body decodes to
    /// `T::default()`. Struct fields match keys regardless of case, so
    /// `"Hostname"` and `"HOSTNAME"` both fill `hostname`; keys inside maps
    /// and free-form [`Value`]s are kept as sent.
    pub fn json<T: DeserializeOwned + Default>(self) -> Result<T> {
        let response = self.error_for_status()?;
        if response.is_empty() {
            return Ok(T::default());
        }

        let value: Value = serde_json::from_slice(&response.body).map_err(|e| {
            Error::invalid_response(format!("response body is not JSON: {}", e)).with_source(e)
        })?;

        decode::from_value(value).map_err(|e| {
            Error::invalid_response(format!("failed to decode response: {}", e)).with_source(e)
        })
    }
}

// ============================================================================
// gRPC Request
// ============================================================================

/// Everything a [`GrpcTransport`] needs besides the message itself.
#[derive(Clone)]
pub struct GrpcRequestDetails {
    /// Full method path, e.g. `/weaviate.v1.Weaviate/Search`.
    pub method: String,
    /// Call metadata.
    pub headers: HashMap<String, String>,
    /// Per-call deadline.
    pub timeout: Option<Duration>,
    /// The logical request this was built from.
    pub request: Option<Arc<dyn LogicalRequest>>,
}

impl GrpcRequestDetails {
    /// Creates details for a method path.
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), headers: HashMap::new(), timeout: None, request: None }
    }

    /// Adds call metadata.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Copies the logical request, timeout and `header:` metadata of a
    /// context.
    #[must_use]
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.request = Some(Arc::clone(ctx.request()));
        if let Some(timeout) = ctx.timeout() {
            self.timeout = Some(timeout);
        }
        for (name, value) in ctx.metadata().headers() {
            self.headers.entry(name.to_ascii_lowercase()).or_insert_with(|| value.to_string());
        }
        self
    }

    /// The service part of the method path.
    pub fn service(&self) -> &str {
        self.split().0
    }

    /// The method name without the service.
    pub fn method_name(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        let path = self.method.trim_start_matches('/');
        path.rsplit_once('/').unwrap_or(("", path))
    }

    /// Operation name of the logical request, if attached.
    pub fn operation_name(&self) -> Option<&str> {
        self.request.as_deref().map(|r| r.operation_name())
    }
}

impl fmt::Debug for GrpcRequestDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcRequestDetails")
            .field("method", &self.method)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .field("operation", &self.operation_name())
            .finish()
    }
}

// ============================================================================
// Transport Traits
// ============================================================================

/// Sends REST requests.
///
/// Implementations observe `token` and return
/// [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled) once it fires. A
/// non-success status is not an error at this level; use
/// [`RestTransportExt::send_json`] or [`RestResponse::error_for_status`].
#[async_trait]
pub trait RestTransport: Send + Sync + 'static {
    /// Sends one request.
    async fn send(
        &self,
        details: RestRequestDetails,
        token: &CancellationToken,
    ) -> Result<RestResponse>;
}

/// Typed helpers available on every [`RestTransport`].
#[async_trait]
pub trait RestTransportExt: RestTransport {
    /// Sends a request and decodes the body with [`RestResponse::json`].
    async fn send_json<T>(
        &self,
        details: RestRequestDetails,
        token: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default + Send;
}

#[async_trait]
impl<R: RestTransport + ?Sized> RestTransportExt for R {
    async fn send_json<T>(
        &self,
        details: RestRequestDetails,
        token: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default + Send,
    {
        self.send(details, token).await?.json()
    }
}

#[async_trait]
impl<R: RestTransport + ?Sized> RestTransport for Arc<R> {
    async fn send(
        &self,
        details: RestRequestDetails,
        token: &CancellationToken,
    ) -> Result<RestResponse> {
        (**self).send(details, token).await
    }
}

/// Makes typed unary gRPC calls.
///
/// Generic over the message types, so it is used through generics rather
/// than trait objects.
#[async_trait]
pub trait GrpcTransport: Send + Sync + 'static {
    /// Sends `message` to `details.method` and decodes the reply.
    async fn unary_call<Req, Resp>(
        &self,
        details: GrpcRequestDetails,
        message: Req,
        token: &CancellationToken,
    ) -> Result<Resp>
    where
        Req: prost::Message + Clone + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static;

    /// Readiness check, independent of any specific call.
    async fn is_healthy(&self, token: &CancellationToken) -> bool;
}

#[async_trait]
impl<G: GrpcTransport> GrpcTransport for Arc<G> {
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
        (**self).unary_call(details, message, token).await
    }

    async fn is_healthy(&self, token: &CancellationToken) -> bool {
        (**self).is_healthy(token).await
    }
}

// ============================================================================
// Tests
// ============================================================================
