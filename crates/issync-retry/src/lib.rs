//! Backoff strategies and a small retry executor.
//!
//! The retrying HTTP transport (`issync-transport`) layers its
//! `Retry-After`-vs-backoff rule on top of [`calculate_delay`]; anything that
//! just needs "try again with exponential backoff" (the file lock's poll
//! loop does not — it polls at a fixed interval — but a future caller might)
//! can use [`RetryExecutor`] directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Strategy for calculating delay between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    Immediate,
    #[default]
    Exponential,
    Linear,
    Constant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub strategy: RetryStrategy,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,
    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
    /// Jitter factor: 0.0 = no jitter, 1.0 = full jitter (delay * [0, 2)).
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_jitter() -> f64 {
    0.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Exponential,
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            jitter: default_jitter(),
        }
    }
}

/// Delay before the next attempt, given the attempt number just made
/// (1-indexed). `Exponential` is `base * 2^(attempt-1)`, matching the
/// retrying transport's backoff contract.
pub fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let delay = match config.strategy {
        RetryStrategy::Immediate => Duration::ZERO,
        RetryStrategy::Exponential => {
            let pow = attempt.saturating_sub(1).min(16);
            config.base_delay.saturating_mul(2_u32.saturating_pow(pow))
        }
        RetryStrategy::Linear => config.base_delay.saturating_mul(attempt),
        RetryStrategy::Constant => config.base_delay,
    };

    let capped = delay.min(config.max_delay);

    if config.jitter > 0.0 { apply_jitter(capped, config.jitter) } else { capped }
}

fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    use rand::Rng;

    let jitter_range = 2.0 * jitter;
    let mut rng = rand::rng();
    let random_value: f64 = rng.random();
    let random_factor = 1.0 - jitter + (random_value * jitter_range);
    let millis = (delay.as_millis() as f64 * random_factor).round() as u64;
    Duration::from_millis(millis)
}

/// Runs a fallible operation, sleeping [`calculate_delay`] between attempts
/// until it succeeds or `max_attempts` is reached.
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// The operation receives the attempt number (starting at 1).
    pub fn run<T, E, F>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt >= self.config.max_attempts {
                        return Err(e);
                    }
                    std::thread::sleep(calculate_delay(&self.config, attempt));
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn immediate_strategy_has_zero_delay() {
        let config = RetryConfig { strategy: RetryStrategy::Immediate, jitter: 0.0, ..RetryConfig::default() };
        assert_eq!(calculate_delay(&config, 1), Duration::ZERO);
        assert_eq!(calculate_delay(&config, 5), Duration::ZERO);
    }

    #[test]
    fn exponential_strategy_doubles_each_attempt() {
        let config = RetryConfig {
            strategy: RetryStrategy::Exponential,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: 0.0,
            max_attempts: 10,
        };
        assert_eq!(calculate_delay(&config, 1), Duration::from_secs(1));
        assert_eq!(calculate_delay(&config, 2), Duration::from_secs(2));
        assert_eq!(calculate_delay(&config, 3), Duration::from_secs(4));
        assert_eq!(calculate_delay(&config, 10), Duration::from_secs(60));
    }

    #[test]
    fn linear_strategy_scales_with_attempt() {
        let config = RetryConfig {
            strategy: RetryStrategy::Linear,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            jitter: 0.0,
            max_attempts: 10,
        };
        assert_eq!(calculate_delay(&config, 2), Duration::from_secs(2));
        assert_eq!(calculate_delay(&config, 15), Duration::from_secs(10));
    }

    #[test]
    fn constant_strategy_is_flat() {
        let config = RetryConfig {
            strategy: RetryStrategy::Constant,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            jitter: 0.0,
            max_attempts: 10,
        };
        assert_eq!(calculate_delay(&config, 1), Duration::from_secs(2));
        assert_eq!(calculate_delay(&config, 10), Duration::from_secs(2));
    }

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn executor_retries_until_success() {
        let executor = RetryExecutor::new(RetryConfig {
            strategy: RetryStrategy::Immediate,
            max_attempts: 5,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        });
        let mut seen = 0;
        let result = executor.run(|attempt| {
            seen = attempt;
            if attempt < 3 { Err("transient") } else { Ok("done") }
        });
        assert_eq!(result, Ok("done"));
        assert_eq!(seen, 3);
    }

    #[test]
    fn executor_gives_up_after_max_attempts() {
        let executor = RetryExecutor::new(RetryConfig {
            strategy: RetryStrategy::Immediate,
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        });
        let result = executor.run(|_| Err::<&str, _>("permanent"));
        assert_eq!(result, Err("permanent"));
    }

    proptest! {
        #[test]
        fn jitter_stays_within_bounds(base_secs in 1u64..10u64, jitter in 0.0f64..1.0f64) {
            let config = RetryConfig {
                strategy: RetryStrategy::Constant,
                base_delay: Duration::from_secs(base_secs),
                max_delay: Duration::from_secs(120),
                jitter,
                max_attempts: 10,
            };
            let delay = calculate_delay(&config, 1);
            let base_millis = (base_secs * 1000) as f64;
            prop_assert!(delay.as_millis() as f64 >= base_millis * (1.0 - jitter) - 1.0);
            prop_assert!(delay.as_millis() as f64 <= base_millis * (1.0 + jitter) + 1.0);
        }

        #[test]
        fn delay_never_exceeds_max_delay(attempt in 1u32..20u32) {
            let config = RetryConfig {
                strategy: RetryStrategy::Exponential,
                base_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(30),
                jitter: 0.0,
                max_attempts: 20,
            };
            prop_assert!(calculate_delay(&config, attempt) <= Duration::from_secs(30));
        }
    }
}
