use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::PacerError;
use crate::Result;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_JITTER_MS: u64 = 2000;

/// Zero-argument delay generator, drawn once per worker per cycle.
pub type JitterFn = Arc<dyn Fn() -> Duration + Send + Sync>;

#[derive(Clone)]
pub struct DispatcherConfig {
    interval: Duration,
    jitter: JitterFn,
}

impl DispatcherConfig {
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(PacerError::Config(
                "interval must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            interval,
            jitter: Arc::new(default_jitter),
        })
    }

    pub fn with_jitter(mut self, jitter: JitterFn) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn jitter_delay(&self) -> Duration {
        (self.jitter)()
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            jitter: Arc::new(default_jitter),
        }
    }
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

fn default_jitter() -> Duration {
    Duration::from_millis(rand::rng().random_range(0..DEFAULT_MAX_JITTER_MS))
}

/// Settings form for hosts that keep dispatcher knobs in stored config.
/// Absent fields fall back to the defaults; `max_jitter_ms = 0` disables
/// the jitter entirely.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatcherSettings {
    pub interval_ms: Option<u64>,
    pub max_jitter_ms: Option<u64>,
}

impl DispatcherSettings {
    pub fn into_config(self) -> Result<DispatcherConfig> {
        let interval = self
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTERVAL);
        let config = DispatcherConfig::new(interval)?;
        Ok(match self.max_jitter_ms {
            None => config,
            Some(0) => config.with_jitter(Arc::new(|| Duration::ZERO)),
            Some(max) => config.with_jitter(Arc::new(move || {
                Duration::from_millis(rand::rng().random_range(0..max))
            })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_thirty_second_interval() {
        let config = DispatcherConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(30));
    }

    #[test]
    fn default_jitter_stays_under_two_seconds() {
        let config = DispatcherConfig::default();
        for _ in 0..64 {
            assert!(config.jitter_delay() < Duration::from_millis(DEFAULT_MAX_JITTER_MS));
        }
    }

    #[test]
    fn zero_interval_is_rejected_at_construction() {
        let err = DispatcherConfig::new(Duration::ZERO).unwrap_err();
        assert!(format!("{err}").contains("interval must be non-zero"));
    }

    #[test]
    fn settings_apply_defaults_for_absent_fields() {
        let settings: DispatcherSettings = serde_json::from_value(serde_json::json!({})).unwrap();
        let config = settings.into_config().unwrap();
        assert_eq!(config.interval(), DEFAULT_INTERVAL);
    }

    #[test]
    fn settings_with_zero_jitter_produce_no_delay() {
        let settings = DispatcherSettings {
            interval_ms: Some(1000),
            max_jitter_ms: Some(0),
        };
        let config = settings.into_config().unwrap();
        assert_eq!(config.interval(), Duration::from_millis(1000));
        assert_eq!(config.jitter_delay(), Duration::ZERO);
    }

    #[test]
    fn settings_with_zero_interval_are_rejected() {
        let settings = DispatcherSettings {
            interval_ms: Some(0),
            max_jitter_ms: None,
        };
        assert!(settings.into_config().is_err());
    }
}
