//! REST transport implementation using reqwest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::retry::with_retry;
use super::traits::{HttpMethod, RestRequestDetails, RestResponse, RestTransport};
use crate::config::{ClientConfig, RetryConfig};
use crate::user_agent;
use crate::{Error, ErrorKind, Result};

// ============================================================================
// REST Stats
// ============================================================================

/// Counters kept by [`HttpTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestStats {
    /// Requests handed to [`RestTransport::send`].
    pub requests_sent: u64,
    /// Requests that ended in a transport error or non-success status.
    pub requests_failed: u64,
    /// Extra attempts made by the retry policy.
    pub retries: u64,
}

// ============================================================================
// HTTP Transport
// ============================================================================

/// [`RestTransport`] over HTTP using reqwest.
///
/// Paths are resolved against the base URL, so a base of
/// `https://host/prefix` sends `/v1/meta` to `https://host/prefix/v1/meta`.
/// Connection errors, timeouts and responses with a status listed in
/// [`RetryConfig::retry_statuses`] (429/502/503/504 by default) are retried
/// according to the [`RetryConfig`]; the final response is returned as-is,
/// whatever its status.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    default_headers: HashMap<String, String>,
    timeout: Duration,
    retry: RetryConfig,
    stats: Arc<RwLock<RestStats>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a new builder.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Creates a transport from the REST half of a [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder()
            .base_url(config.rest_url()?)
            .headers(config.default_headers())
            .timeout(config.timeouts.request)
            .connect_timeout(config.timeouts.connect)
            .retry_config(config.retry.clone())
            .build()
    }

    /// The base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Snapshot of the transport counters.
    pub fn stats(&self) -> RestStats {
        *self.stats.read()
    }

    /// Resolves `path` (with optional query) against the base URL.
    pub(crate) fn url_for(&self, path: &str) -> Result<Url> {
        self.base_url.join(path.trim_start_matches('/')).map_err(|e| {
            Error::invalid_argument(format!("invalid request path {:?}: {}", path, e))
                .with_source(e)
        })
    }

    fn build_headers(&self, details: &RestRequestDetails) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-weaviate-client"),
            HeaderValue::from_static(user_agent::client_header_value()),
        );

        for (name, value) in self.default_headers.iter().chain(details.headers.iter()) {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::invalid_argument(format!("invalid header name {:?}", name)).with_source(e)
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                Error::invalid_argument(format!("invalid value for header {}", name)).with_source(e)
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    async fn send_once(
        &self,
        url: Url,
        headers: HeaderMap,
        details: &RestRequestDetails,
    ) -> Result<RestResponse> {
        let mut request = self
            .client
            .request(to_reqwest_method(details.method), url)
            .headers(headers)
            .timeout(details.timeout.unwrap_or(self.timeout));
        if let Some(body) = details.body.clone() {
            request = request.body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(RestResponse { status, headers, body })
    }
}

#[async_trait]
impl RestTransport for HttpTransport {
    async fn send(
        &self,
        details: RestRequestDetails,
        token: &CancellationToken,
    ) -> Result<RestResponse> {
        let url = self.url_for(&details.path)?;
        let headers = self.build_headers(&details)?;
        self.stats.write().requests_sent += 1;

        let retry = &self.retry;
        let (url, headers, details) = (&url, &headers, &details);
        let result = with_retry(&self.retry, token, "rest", move |attempt| {
            if attempt > 0 {
                self.stats.write().retries += 1;
            }
            let url = url.clone();
            let headers = headers.clone();
            async move {
                let response = self.send_once(url, headers, details).await?;
                if attempt < retry.max_retries && retry.retries_status(response.status) {
                    let kind = if response.status == 429 {
                        ErrorKind::RateLimited
                    } else {
                        ErrorKind::Unavailable
                    };
                    return Err(Error::new(kind, format!("HTTP {}", response.status))
                        .with_status(response.status));
                }
                Ok(response)
            }
        })
        .await;

        let failed = result.as_ref().map_or(true, |response| !response.is_success());
        if failed {
            self.stats.write().requests_failed += 1;
        }
        result
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

/// Maps reqwest errors to client errors.
fn map_reqwest_error(e: reqwest::Error) -> Error {
    let kind = if e.is_timeout() {
        ErrorKind::Timeout
    } else if e.is_connect() {
        ErrorKind::Connection
    } else if e.is_builder() || e.is_request() {
        ErrorKind::InvalidArgument
    } else if e.is_decode() || e.is_body() {
        ErrorKind::Protocol
    } else {
        ErrorKind::Transport
    };
    Error::new(kind, format!("HTTP request failed: {}", e)).with_source(e)
}

// ============================================================================
// HTTP Transport Builder
// ============================================================================

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    base_url: Option<Url>,
    headers: HashMap<String, String>,
    timeout: Duration,
    connect_timeout: Duration,
    retry_config: RetryConfig,
}

impl HttpTransportBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            headers: HashMap::new(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry_config: RetryConfig::default(),
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Parses and sets the base URL.
    pub fn base_url_str(self, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| {
            Error::configuration(format!("invalid base URL {:?}: {}", url, e)).with_source(e)
        })?;
        Ok(self.base_url(url))
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds headers sent with every request.
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the default per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Builds the transport.
    pub fn build(self) -> Result<HttpTransport> {
        let mut base_url =
            self.base_url.ok_or_else(|| Error::configuration("base URL is required"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(user_agent::user_agent())
            .build()
            .map_err(|e| {
                Error::configuration(format!("failed to create HTTP client: {}", e)).with_source(e)
            })?;

        Ok(HttpTransport {
            client,
            base_url,
            default_headers: self.headers,
            timeout: self.timeout,
            retry: self.retry_config,
            stats: Arc::new(RwLock::new(RestStats::default())),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
