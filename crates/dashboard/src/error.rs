use crate::client::BlockTag;
use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use std::{future::Future, time::Duration};
use thiserror::Error;
use tracing::warn;

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("abi decode error: {0}")]
    AbiDecode(#[from] alloy_sol_types::Error),
    #[error("block not found: {0}")]
    BlockNotFound(BlockTag),
    #[error("refresh cancelled")]
    Cancelled,
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("http status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("json-rpc error {code}: {message}")]
    JsonRpc { code: i64, message: String },
    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),
    #[error("unit conversion error: {0}")]
    Units(#[from] alloy_primitives::utils::UnitsError),
}

/// Exponential backoff applied to rate-limited RPC calls.
///
/// Retry `attempt` (starting at 0) waits `base_delay * 2^attempt`; at most
/// `max_retries` retries follow the initial try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn backoff(&self) -> ExponentialBuilder {
        let last_attempt = u32::try_from(self.max_retries.saturating_sub(1)).unwrap_or(u32::MAX);

        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.delay_for(last_attempt))
            .with_factor(2.0)
            .with_max_times(self.max_retries)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_millis(500))
    }
}

/// Runs `operation`, retrying only on rate-limit errors.
pub async fn rpc_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation: F,
    label: &'static str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_when(policy, operation, is_rate_limited, label).await
}

pub async fn retry_when<F, Fut, T, P>(
    policy: &RetryPolicy,
    operation: F,
    should_retry: P,
    label: &'static str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: FnMut(&Error) -> bool,
{
    let mut op = operation;
    let mut attempt = 0usize;

    (move || op())
        .retry(policy.backoff())
        .when(should_retry)
        .notify(|err: &Error, delay: Duration| {
            attempt += 1;
            warn!(attempt, retry_in = ?delay, error = %err, operation = label, "rate limited by RPC provider");
            metrics::counter!("chain_dashboard_rpc_rate_limited", "operation" => label).increment(1);
        })
        .await
}

pub fn is_rate_limited(err: &Error) -> bool {
    match err {
        Error::HttpStatus { status, body } => {
            *status == StatusCode::TOO_MANY_REQUESTS || mentions_rate_limit(body)
        }
        Error::Http(http_err) => http_err.status() == Some(StatusCode::TOO_MANY_REQUESTS),
        Error::JsonRpc { code, message } => *code == 429 || mentions_rate_limit(message),
        _ => false,
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["rate limit", "rate-limit", "too many requests"]
        .iter()
        .any(|needle| message.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rate_limited() -> Error {
        Error::JsonRpc {
            code: -32005,
            message: "Rate limit exceeded".to_string(),
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[test]
    fn classifies_rate_limit_errors() {
        assert!(is_rate_limited(&Error::HttpStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        }));
        assert!(is_rate_limited(&Error::HttpStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: r#"{"error":"Rate limit exceeded, retry later"}"#.to_string(),
        }));
        assert!(is_rate_limited(&rate_limited()));
        assert!(is_rate_limited(&Error::JsonRpc {
            code: 429,
            message: "slow down".to_string(),
        }));
        assert!(is_rate_limited(&Error::JsonRpc {
            code: -32000,
            message: "Too Many Requests".to_string(),
        }));

        assert!(!is_rate_limited(&Error::HttpStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "internal error".to_string(),
        }));
        assert!(!is_rate_limited(&Error::HttpStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        }));
        assert!(!is_rate_limited(&Error::JsonRpc {
            code: -32000,
            message: "execution reverted".to_string(),
        }));
        assert!(!is_rate_limited(&Error::BlockNotFound(BlockTag::Latest)));
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(4, Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn recovers_after_transient_rate_limits() {
        let calls = AtomicUsize::new(0);

        let result = rpc_with_retry(
            &fast_policy(4),
            || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 3 {
                        Err(rate_limited())
                    } else {
                        Ok(call)
                    }
                }
            },
            "flaky",
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn gives_up_after_retry_bound() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = rpc_with_retry(
            &fast_policy(4),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            },
            "always_limited",
        )
        .await;

        assert!(matches!(result, Err(Error::JsonRpc { code: -32005, .. })));
        // one initial try plus four retries
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn permanent_errors_fail_fast() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = rpc_with_retry(
            &fast_policy(4),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(Error::JsonRpc {
                        code: -32602,
                        message: "invalid params".to_string(),
                    })
                }
            },
            "bad_call",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_unavailable_status_with_rate_limit_body() {
        let calls = AtomicUsize::new(0);

        let result = rpc_with_retry(
            &fast_policy(4),
            || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 2 {
                        Err(Error::HttpStatus {
                            status: StatusCode::SERVICE_UNAVAILABLE,
                            body: "rate limit exceeded".to_string(),
                        })
                    } else {
                        Ok(call)
                    }
                }
            },
            "proxy_limited",
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn custom_predicate_controls_retries() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry_when(
            &fast_policy(2),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::BlockNotFound(BlockTag::Number(7))) }
            },
            |err| matches!(err, Error::BlockNotFound(_)),
            "missing_block",
        )
        .await;

        assert!(matches!(result, Err(Error::BlockNotFound(BlockTag::Number(7)))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
