use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Knobs for a build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Records per write batch
    pub batch_size: usize,
    /// Retries after the first failed attempt of a chunk
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry
    pub backoff_base_ms: u64,
    /// Upper bound on a single retry delay
    pub backoff_max_ms: u64,
    /// Skip records without a `Name` instead of keying them by WALS code
    pub require_identifier_name: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_retries: 3,
            backoff_base_ms: 200,
            backoff_max_ms: 5_000,
            require_identifier_name: false,
        }
    }
}

impl BuildConfig {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let ms = self
            .backoff_base_ms
            .saturating_mul(factor)
            .min(self.backoff_max_ms);
        Duration::from_millis(ms)
    }

    /// Batch size, never zero.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = BuildConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_millis(200));
        assert_eq!(config.backoff_for(2), Duration::from_millis(400));
        assert_eq!(config.backoff_for(3), Duration::from_millis(800));
        assert_eq!(config.backoff_for(10), Duration::from_millis(5_000));
        assert_eq!(config.backoff_for(200), Duration::from_millis(5_000));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: BuildConfig = serde_json::from_str(r#"{"batch_size": 50}"#).unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let config = BuildConfig {
            batch_size: 0,
            ..BuildConfig::default()
        };
        assert_eq!(config.effective_batch_size(), 1);
    }
}
