use std::time::Duration;

use issync_retry::RetryConfig;
use serde::{Deserialize, Serialize};

/// Default set of response status codes that trigger a retry.
pub const DEFAULT_RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retryable_statuses() -> Vec<u16> {
    DEFAULT_RETRYABLE_STATUSES.to_vec()
}

/// Configuration for [`crate::RetryingTransport`].
///
/// `retry.max_attempts` bounds the total number of attempts (the first try
/// plus retries); `retry.base_delay` is the exponential backoff base. These
/// reuse `issync_retry::RetryConfig` directly rather than redeclaring the
/// same three knobs under different names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_timeout", with = "issync_types::duration_serde")]
    pub timeout: Duration,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout: default_timeout(), retry: RetryConfig::default(), retryable_statuses: default_retryable_statuses() }
    }
}

impl TransportConfig {
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.retryable_statuses, vec![429, 500, 502, 503, 504]);
    }

    #[test]
    fn deserializes_timeout_as_string_or_millis() {
        let from_string: TransportConfig = serde_json::from_str(r#"{"timeout":"10s"}"#).unwrap();
        assert_eq!(from_string.timeout, Duration::from_secs(10));

        let from_millis: TransportConfig = serde_json::from_str(r#"{"timeout":10000}"#).unwrap();
        assert_eq!(from_millis.timeout, Duration::from_secs(10));
    }
}
