//! gRPC transport implementation using tonic.
//!
//! Calls are made against a dynamic method path with
//! [`tonic_prost::ProstCodec`], so any pair of prost messages can be sent
//! without generated service stubs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use url::Url;

use super::health::{HEALTH_CHECK_METHOD, HealthCheckRequest, HealthCheckResponse};
use super::retry::with_retry;
use super::traits::{GrpcRequestDetails, GrpcTransport};
use crate::config::{ClientConfig, RetryConfig};
use crate::user_agent;
use crate::{Error, ErrorKind, Result};

/// Counters kept by [`TonicTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrpcStats {
    /// Calls handed to [`GrpcTransport::unary_call`].
    pub requests_sent: u64,
    /// Calls that ended in an error.
    pub requests_failed: u64,
    /// Extra attempts made by the retry policy.
    pub retries: u64,
}

/// [`GrpcTransport`] over HTTP/2 using tonic.
///
/// The channel connects lazily on first use and reconnects on its own.
/// `Unavailable`, connection errors and timeouts are retried according to
/// the [`RetryConfig`].
#[derive(Clone)]
pub struct TonicTransport {
    channel: Channel,
    endpoint: Url,
    default_headers: HashMap<String, String>,
    timeout: Duration,
    health_timeout: Duration,
    retry: RetryConfig,
    stats: Arc<RwLock<GrpcStats>>,
}

impl std::fmt::Debug for TonicTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TonicTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TonicTransport {
    /// Creates a new builder.
    pub fn builder(endpoint: Url) -> TonicTransportBuilder {
        TonicTransportBuilder::new(endpoint)
    }

    /// Creates a transport from the gRPC half of a [`ClientConfig`].
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder(config.grpc_url()?)
            .headers(config.default_headers())
            .timeout(config.timeouts.request)
            .connect_timeout(config.timeouts.connect)
            .health_timeout(config.timeouts.health)
            .retry_config(config.retry.clone())
            .build()
    }

    /// The endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Snapshot of the transport counters.
    pub fn stats(&self) -> GrpcStats {
        *self.stats.read()
    }

    fn build_metadata(&self, details: &GrpcRequestDetails) -> Result<MetadataMap> {
        let mut metadata = MetadataMap::new();
        metadata.insert(
            AsciiMetadataKey::from_static("x-weaviate-client"),
            AsciiMetadataValue::from_static(user_agent::client_header_value()),
        );

        for (name, value) in self.default_headers.iter().chain(details.headers.iter()) {
            let key = AsciiMetadataKey::from_bytes(name.to_ascii_lowercase().as_bytes())
                .map_err(|e| {
                    Error::invalid_argument(format!("invalid metadata key {:?}", name))
                        .with_source(e)
                })?;
            let value = AsciiMetadataValue::try_from(value.as_str()).map_err(|e| {
                Error::invalid_argument(format!("invalid value for metadata key {}", name))
                    .with_source(e)
            })?;
            metadata.insert(key, value);
        }
        Ok(metadata)
    }

    async fn call_once<Req, Resp>(
        &self,
        path: PathAndQuery,
        metadata: MetadataMap,
        timeout: Duration,
        message: Req,
    ) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut request = tonic::Request::new(message);
        *request.metadata_mut() = metadata;
        request.set_timeout(timeout);

        let call = async {
            let mut grpc = tonic::client::Grpc::new(self.channel.clone());
            grpc.ready().await.map_err(|e| {
                Error::connection(format!("gRPC channel not ready: {}", e)).with_source(e)
            })?;
            let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
            grpc.unary(request, path, codec)
                .await
                .map(tonic::Response::into_inner)
                .map_err(map_status)
        };

        tokio::time::timeout(timeout, call).await.map_err(|_| {
            Error::timeout(format!("gRPC call timed out after {:?}", timeout))
        })?
    }
}

#[async_trait]
impl GrpcTransport for TonicTransport {
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
        let path = PathAndQuery::try_from(details.method.as_str()).map_err(|e| {
            Error::invalid_argument(format!("invalid gRPC method {:?}", details.method))
                .with_source(e)
        })?;
        let metadata = self.build_metadata(&details)?;
        let timeout = details.timeout.unwrap_or(self.timeout);
        self.stats.write().requests_sent += 1;

        let (path, metadata, message) = (&path, &metadata, &message);
        let result = with_retry(&self.retry, token, "grpc", move |attempt| {
            if attempt > 0 {
                self.stats.write().retries += 1;
            }
            self.call_once::<Req, Resp>(path.clone(), metadata.clone(), timeout, message.clone())
        })
        .await;

        if let Err(ref error) = result {
            self.stats.write().requests_failed += 1;
            tracing::debug!(method = %details.method, error = %error, "gRPC call failed");
        }
        result
    }

    async fn is_healthy(&self, token: &CancellationToken) -> bool {
        let details = GrpcRequestDetails::new(HEALTH_CHECK_METHOD);
        let (path, metadata) = match (
            PathAndQuery::try_from(HEALTH_CHECK_METHOD),
            self.build_metadata(&details),
        ) {
            (Ok(path), Ok(metadata)) => (path, metadata),
            _ => return false,
        };

        let check = self.call_once::<HealthCheckRequest, HealthCheckResponse>(
            path,
            metadata,
            self.health_timeout,
            HealthCheckRequest::default(),
        );

        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            result = check => match result {
                Ok(response) => response.is_serving(),
                Err(error) => {
                    tracing::debug!(
                        endpoint = %self.endpoint,
                        error = %error,
                        "health check failed"
                    );
                    false
                },
            },
        }
    }
}

/// Maps a gRPC status to a client error.
fn map_status(status: tonic::Status) -> Error {
    let kind = ErrorKind::from_grpc_code(status.code() as i32);
    Error::new(kind, status.message().to_string()).with_source(status)
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`TonicTransport`].
#[derive(Debug)]
pub struct TonicTransportBuilder {
    endpoint: Url,
    headers: HashMap<String, String>,
    timeout: Duration,
    connect_timeout: Duration,
    health_timeout: Duration,
    retry_config: RetryConfig,
}

impl TonicTransportBuilder {
    fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            headers: HashMap::new(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(2),
            retry_config: RetryConfig::default(),
        }
    }

    /// Adds metadata sent with every call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds metadata sent with every call.
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the default per-call deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the deadline of health checks.
    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Builds the transport. The channel is not connected until first use.
    pub fn build(self) -> Result<TonicTransport> {
        let mut endpoint = Endpoint::from_shared(self.endpoint.to_string())
            .map_err(|e| {
                Error::configuration(format!("invalid gRPC endpoint {}: {}", self.endpoint, e))
                    .with_source(e)
            })?
            .connect_timeout(self.connect_timeout)
            .user_agent(user_agent::user_agent())
            .map_err(|e| {
                Error::configuration(format!("invalid user agent: {}", e)).with_source(e)
            })?;

        if self.endpoint.scheme() == "https" {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(|e| {
                    Error::configuration(format!("invalid TLS configuration: {}", e)).with_source(e)
                })?;
        }

        Ok(TonicTransport {
            channel: endpoint.connect_lazy(),
            endpoint: self.endpoint,
            default_headers: self.headers,
            timeout: self.timeout,
            health_timeout: self.health_timeout,
            retry: self.retry_config,
            stats: Arc::new(RwLock::new(GrpcStats::default())),
        })
    }
}
