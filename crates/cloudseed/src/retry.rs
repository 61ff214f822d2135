//! Provider calls with timeout, bounded retry and cancellation.
//!
//! Every attempt runs under `tokio::time::timeout`. Transient failures
//! (throttling, 5xx) are retried with `backon::ExponentialBuilder`; all other
//! errors return at once. A timeout is not retried here: the request may have
//! landed, and the create-or-noop contract lets a later run reconcile it.

use crate::aws::AwsError;
use backon::{ExponentialBuilder, Retryable};
use cloudseed_common::defaults::{
    DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry and timeout settings for a single provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap for exponential growth of the delay
    pub max_delay: Duration,
    /// Deadline for each individual attempt
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn no_retry(request_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            request_timeout,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_jitter()
            .with_max_times(retries)
    }
}

/// Run one provider call under `policy`.
///
/// # Arguments
/// * `policy` - Attempt budget, backoff and per-attempt timeout
/// * `operation` - Name for logging
/// * `cancel` - Optional cancellation token; cancelling yields [`AwsError::Cancelled`]
/// * `call` - Produces a fresh request future for each attempt
///
/// # Returns
/// * `Ok(T)` - An attempt succeeded
/// * `Err(AwsError::Timeout)` - An attempt exceeded `request_timeout`
/// * `Err(AwsError::Cancelled)` - The token fired before a result arrived
/// * `Err(e)` - A non-retryable error, or the last transient error once the
///   budget is spent
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    cancel: Option<&CancellationToken>,
    mut call: F,
) -> Result<T, AwsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AwsError>>,
{
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(AwsError::Cancelled);
    }

    let request_timeout = policy.request_timeout;
    let attempt = move || {
        let request = call();
        async move {
            match tokio::time::timeout(request_timeout, request).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(operation, timeout = ?request_timeout, "Provider call timed out");
                    Err(AwsError::Timeout)
                }
            }
        }
    };

    let retrying = attempt
        .retry(policy.backoff())
        .when(|e: &AwsError| e.is_retryable())
        .notify(|e: &AwsError, delay: Duration| {
            warn!(
                operation,
                delay = ?delay,
                error = %e,
                "Transient provider error, retrying..."
            );
        });

    let result = match cancel {
        Some(token) => {
            tokio::select! {
                result = retrying => result,
                _ = token.cancelled() => {
                    warn!(operation, "Call cancelled; remote outcome is indeterminate");
                    Err(AwsError::Cancelled)
                }
            }
        }
        None => retrying.await,
    };

    if result.is_ok() {
        debug!(operation, "Provider call succeeded");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            request_timeout: Duration::from_secs(1),
        }
    }

    fn throttled() -> AwsError {
        AwsError::Throttled {
            message: "Rate exceeded".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);

        let result = call_with_retry(&fast_policy(4), "create-user", None, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err(throttled()) } else { Ok(n) }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_is_bounded() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> =
            call_with_retry(&fast_policy(3), "create-user", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AwsError::Unavailable {
                    message: "503".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(AwsError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_are_never_retried() {
        let errors: [fn() -> AwsError; 3] = [
            || AwsError::AccessDenied {
                message: "denied".to_string(),
            },
            || AwsError::Rejected {
                code: "MalformedPolicyDocument".to_string(),
                message: "bad".to_string(),
            },
            || AwsError::AlreadyExists,
        ];
        for err in errors {
            let calls = AtomicU32::new(0);
            let result: Result<(), _> =
                call_with_retry(&fast_policy(5), "put-user-policy", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(err())
                })
                .await;

            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_policy_does_not_retry() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::no_retry(Duration::from_secs(1));

        let result: Result<(), _> = call_with_retry(&policy, "create-bucket", None, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(throttled())
        })
        .await;

        assert!(matches!(result, Err(AwsError::Throttled { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_request_times_out_without_retry() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> =
            call_with_retry(&fast_policy(4), "create-user", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<Result<(), AwsError>>().await
            })
            .await;

        assert!(matches!(result, Err(AwsError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_in_flight_call() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let policy = fast_policy(1);

        let call = call_with_retry(&policy, "create-user", Some(&token), || async {
            std::future::pending::<Result<(), AwsError>>().await
        });
        let cancel_soon = async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        };

        let (result, ()) = tokio::join!(call, cancel_soon);
        assert!(matches!(result, Err(AwsError::Cancelled)));
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_the_call() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> =
            call_with_retry(&fast_policy(3), "create-user", Some(&token), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AwsError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn default_policy_matches_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.request_timeout, Duration::from_secs(30));
        assert!(policy.initial_delay < policy.max_delay);
    }
}
