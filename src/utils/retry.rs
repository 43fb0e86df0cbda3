use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio::time::sleep;

use crate::utils::error::Error;

/// Pause before every physical exchange. The PZEM-017 misbehaves when
/// polled back-to-back, so this is required, not a tuning knob.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Pause between a failed attempt and the next retry.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Bounded retry policy shared by all register operations on one device.
///
/// A budget of 0 means "no retries": a single attempt is made and any
/// failure propagates immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub settle_delay: Duration,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            settle_delay: SETTLE_DELAY,
            retry_delay: RETRY_DELAY,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Runs one fallible transport call under the bounded retry policy.
///
/// The thunk takes no arguments; callers bind register address and value
/// before handing it over. Only transient transport failures (no response,
/// I/O error, timeout) are retried. With a budget of N >= 1 at most N
/// attempts are made; exhaustion surfaces as [`Error::RetriesExhausted`]
/// carrying the operation name and the last underlying error.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut failures: u32 = 0;
    loop {
        sleep(policy.settle_delay).await;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                failures += 1;
                if policy.max_retries == 0 {
                    return Err(err);
                }
                if failures >= policy.max_retries {
                    return Err(Error::RetriesExhausted {
                        operation,
                        attempts: failures,
                        source: Box::new(err),
                    });
                }
                warn!(
                    "Transient failure in {} (attempt {}/{}), retrying: {}",
                    operation, failures, policy.max_retries, err
                );
                sleep(policy.retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
