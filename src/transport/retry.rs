//! Retry loop shared by the real transports.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::{Error, Result};

/// Runs `attempt` until it succeeds, fails with a non-retriable error, runs
/// out of retries or `token` is cancelled.
///
/// `attempt` receives the zero-based attempt number. Cancellation is checked
/// while an attempt is in flight and while backing off.
pub(crate) async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    token: &CancellationToken,
    label: &str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut number = 0;
    loop {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::cancelled()),
            outcome = attempt(number) => outcome,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(error) if number < config.max_retries && config.should_retry(&error) => {
                let delay = config.delay_for_attempt(number + 1);
                tracing::debug!(
                    transport = label,
                    attempt = number + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying request"
                );
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(Error::cancelled()),
                    _ = tokio::time::sleep(delay) => {},
                }
                number += 1;
            },
            Err(error) => return Err(error),
        }
    }
}
