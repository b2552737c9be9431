//! Timeout configuration for transports.

use std::time::Duration;

/// Default timeouts applied by the real transports.
///
/// A timeout carried on a [`RequestContext`](crate::RequestContext) always
/// wins over `request`; these values only fill in when the context has none.
///
/// ## Example
///
/// ```rust
/// use weaviate::TimeoutConfig;
/// use std::time::Duration;
///
/// let timeouts = TimeoutConfig::builder()
///     .request(Duration::from_secs(60))
///     .build();
/// assert_eq!(timeouts.connect, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct TimeoutConfig {
    /// Timeout for establishing a connection.
    #[builder(default = Duration::from_secs(10))]
    pub connect: Duration,

    /// Default per-request timeout.
    #[builder(default = Duration::from_secs(30))]
    pub request: Duration,

    /// Timeout for readiness and health checks.
    #[builder(default = Duration::from_secs(2))]
    pub health: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
