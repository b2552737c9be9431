//! Backoff policy for [`HttpTransport`](crate::transport::HttpTransport) and
//! [`TonicTransport`](crate::transport::TonicTransport).

use std::time::Duration;

use crate::{Error, ErrorKind};

/// Statuses a Weaviate node answers while overloaded or restarting.
const DEFAULT_RETRY_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// How the real transports resend a wire request after a transient failure.
///
/// The request pipeline never retries: its executor runs once and the
/// transport may resend underneath that call. A REST response with one of
/// [`retry_statuses`](Self::retry_statuses) is resent while attempts remain;
/// after the last attempt it is handed back unchanged. Errors are resent
/// when their kind is `Unavailable`, `RateLimited`, `Timeout` or
/// `Connection`.
///
/// The delay before retry `n` is `initial_delay * multiplier^(n - 1)`,
/// capped at `max_delay` and spread by `jitter` in either direction.
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use weaviate::RetryConfig;
///
/// let config = RetryConfig::default()
///     .with_max_retries(5)
///     .with_initial_delay(Duration::from_millis(250))
///     .with_retry_statuses([503]);
///
/// assert!(config.retries_status(503));
/// assert!(!config.retries_status(429));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Resends after the first attempt. `0` disables retries.
    pub max_retries: u32,
    /// Delay before the first resend.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Fraction of the delay, in `0.0..=1.0`, randomly added or removed.
    pub jitter: f64,
    /// HTTP statuses that trigger a resend.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.1,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no resends.
    pub fn disabled() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Sets the number of resends.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first resend.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound for a single delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the growth factor between delays.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Replaces the HTTP statuses that trigger a resend.
    #[must_use]
    pub fn with_retry_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_statuses = statuses.into_iter().collect();
        self
    }

    /// Returns `true` if retries are enabled.
    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Returns `true` if a REST response with `status` should be resent.
    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Returns `true` if `error` is transient. Cancellation never is.
    pub fn should_retry(&self, error: &Error) -> bool {
        matches!(
            error.kind(),
            ErrorKind::Unavailable
                | ErrorKind::RateLimited
                | ErrorKind::Timeout
                | ErrorKind::Connection
        )
    }

    /// Delay before resend number `retry`. Attempt `0` is the first send and
    /// waits for nothing.
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let Some(exponent) = retry.checked_sub(1) else {
            return Duration::ZERO;
        };

        let growth = self.multiplier.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        let backoff = Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * growth)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay));
        if self.jitter <= 0.0 {
            return backoff;
        }

        let spread = backoff.as_secs_f64() * self.jitter;
        let offset = fastrand::f64().mul_add(2.0 * spread, -spread);
        Duration::try_from_secs_f64(backoff.as_secs_f64() + offset).unwrap_or(Duration::ZERO)
    }
}
