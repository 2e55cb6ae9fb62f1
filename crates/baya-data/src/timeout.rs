//! Timeout configuration for fetch operations.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Timeout configuration for a fetch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total time for one attempt, body included.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: Duration::from_millis(total.as_millis() as u64 / 4),
            total,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_total(Duration::from_secs(10))
    }
}

/// Run `attempt` under a total timeout.
pub async fn with_timeout<T, F>(limit: Duration, what: &str, attempt: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(format!("{what} after {limit:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_total_splits_connect() {
        let config = TimeoutConfig::from_total(Duration::from_millis(400));
        assert_eq!(config.connect, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, FetchError>(1)
        };
        let err = with_timeout(Duration::from_millis(10), "GET /articles", slow)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let fast = async { Ok::<_, FetchError>(7) };
        assert_eq!(with_timeout(Duration::from_secs(1), "x", fast).await.unwrap(), 7);
    }
}
