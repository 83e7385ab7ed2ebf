use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the fixed-window request limiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_window: u64,
    #[serde(with = "humantime_serde")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 20,
            window: Duration::from_secs(5),
        }
    }
}

impl RateLimitConfig {
    /// Create an enabled configuration
    pub fn new(requests_per_window: u64, window: Duration) -> Self {
        Self {
            enabled: true,
            requests_per_window,
            window,
        }
    }

    /// Create a configuration that admits every request
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Validate parameters. A disabled limiter is always valid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.requests_per_window == 0 {
            return Err("Requests per window must be greater than 0".to_string());
        }
        if self.window.is_zero() {
            return Err("Window duration must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RateLimitConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_requests_rejected() {
        let config = RateLimitConfig::new(0, Duration::from_secs(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = RateLimitConfig::new(5, Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_skips_validation() {
        let config = RateLimitConfig {
            enabled: false,
            requests_per_window: 0,
            window: Duration::ZERO,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_serializes_as_humantime() {
        let config = RateLimitConfig::new(5, Duration::from_secs(90));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["window"], "1m 30s");

        let parsed: RateLimitConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }
}
