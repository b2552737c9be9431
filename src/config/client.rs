//! Connection configuration for the client facade.

use std::collections::HashMap;

use url::Url;

use super::{RetryConfig, TimeoutConfig};
use crate::Error;

/// Default REST endpoint of a local Weaviate instance.
pub const DEFAULT_REST_ENDPOINT: &str = "http://localhost:8080";

/// Default gRPC endpoint of a local Weaviate instance.
pub const DEFAULT_GRPC_ENDPOINT: &str = "http://localhost:50051";

/// Environment variable overriding the REST endpoint.
pub const ENV_REST_URL: &str = "WEAVIATE_REST_URL";

/// Environment variable overriding the gRPC endpoint.
pub const ENV_GRPC_URL: &str = "WEAVIATE_GRPC_URL";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "WEAVIATE_API_KEY";

/// Endpoints, credentials and transport tuning for a [`Client`](crate::Client).
///
/// ## Example
///
/// ```rust
/// use weaviate::{ClientConfig, RetryConfig};
///
/// let config = ClientConfig::builder()
///     .rest_endpoint("https://cluster.example.com")
///     .grpc_endpoint("https://grpc-cluster.example.com")
///     .api_key("secret")
///     .retry(RetryConfig::disabled())
///     .build();
///
/// assert_eq!(config.rest_url().unwrap().host_str(), Some("cluster.example.com"));
/// assert_eq!(config.default_headers()["Authorization"], "Bearer secret");
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    #[builder(into, default = DEFAULT_REST_ENDPOINT.to_string())]
    pub rest_endpoint: String,

    /// URL of the gRPC API.
    #[builder(into, default = DEFAULT_GRPC_ENDPOINT.to_string())]
    pub grpc_endpoint: String,

    /// Static headers sent with every REST request and as gRPC metadata.
    #[builder(default)]
    pub headers: HashMap<String, String>,

    /// API key, sent as a bearer token.
    #[builder(into)]
    pub api_key: Option<String>,

    /// Transport timeouts.
    #[builder(default)]
    pub timeouts: TimeoutConfig,

    /// Transport retry policy.
    #[builder(default)]
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Configuration for an instance on `localhost` with default ports.
    pub fn local() -> Self {
        Self::default()
    }

    /// Builds a configuration from `WEAVIATE_REST_URL`, `WEAVIATE_GRPC_URL`
    /// and `WEAVIATE_API_KEY`, falling back to the local defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_REST_URL) {
            config.rest_endpoint = url;
        }
        if let Some(url) = lookup(ENV_GRPC_URL) {
            config.grpc_endpoint = url;
        }
        config.api_key = lookup(ENV_API_KEY).filter(|key| !key.is_empty());
        config
    }

    /// Parses the REST endpoint.
    pub fn rest_url(&self) -> Result<Url, Error> {
        parse_endpoint("REST", &self.rest_endpoint)
    }

    /// Parses the gRPC endpoint.
    pub fn grpc_url(&self) -> Result<Url, Error> {
        parse_endpoint("gRPC", &self.grpc_endpoint)
    }

    /// Headers every transport should send: the static headers plus the
    /// `Authorization` header derived from the API key.
    pub fn default_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        if let Some(ref key) = self.api_key {
            headers.insert("Authorization".to_string(), format!("Bearer {}", key));
        }
        headers
    }

    /// Validates both endpoints.
    pub fn validate(&self) -> Result<(), Error> {
        self.rest_url()?;
        self.grpc_url()?;
        Ok(())
    }
}

fn parse_endpoint(label: &str, endpoint: &str) -> Result<Url, Error> {
    let url = Url::parse(endpoint).map_err(|e| {
        Error::configuration(format!("invalid {} endpoint {:?}: {}", label, endpoint, e))
            .with_source(e)
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::configuration(format!(
            "unsupported {} endpoint scheme {:?}, expected http or https",
            label, scheme
        ))),
    }
}
