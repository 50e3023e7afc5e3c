//! Transient failure retry
//!
//! Retries a terminology request with exponential backoff until
//! `max_wait_ms` elapses. Only errors classified as transient by
//! [`RxNavError::is_transient`] are retried.

use crate::services::rxnav_client::RxNavError;
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_MS: u64 = 5000;

/// Retry an operation with exponential backoff until `max_wait_ms` elapses.
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the error is transient:
///    a. If time elapsed < max_wait_ms: log WARN, backoff, retry
///    b. If time elapsed >= max_wait_ms: log ERROR, return the last error
/// 4. If the error is not transient: return it immediately
///
/// **Backoff Strategy:**
/// - Initial delay: 250ms
/// - Max delay: 5000ms
/// - Multiplier: 2.0 (exponential)
/// - Never sleeps past the `max_wait_ms` budget
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T, RxNavError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RxNavError>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_transient() {
                    return Err(err);
                }

                let elapsed = start_time.elapsed();
                if elapsed >= max_duration {
                    if max_wait_ms > 0 {
                        tracing::error!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = elapsed.as_millis() as u64,
                            max_wait_ms,
                            error = %err,
                            "Request failed: max retry time exceeded"
                        );
                    }
                    return Err(err);
                }

                let remaining = max_duration - elapsed;
                let delay = Duration::from_millis(backoff_ms).min(remaining);

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(delay).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}
