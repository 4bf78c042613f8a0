use crate::error::{Result, TrendingError};
use serde::{Deserialize, Serialize};

/// Configuration for window layout and scoring behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendingConfig {
    /// Duration of each window in seconds
    pub window_size_seconds: i64,

    /// Spacing between consecutive window starts in seconds (<= window size)
    pub granularity_seconds: i64,

    /// Drop globally empty windows from every baseline instead of counting them as zeros
    pub ignore_empty_windows: bool,

    /// What to do with current-batch tokens that have no history
    pub unknown_tokens: UnknownTokenPolicy,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_size_seconds: 15 * 60,
            granularity_seconds: 2 * 60,
            ignore_empty_windows: false,
            unknown_tokens: UnknownTokenPolicy::Zero,
        }
    }
}

impl TrendingConfig {
    /// Create a config with explicit window layout and default policies
    #[must_use]
    pub fn new(
        window_size_seconds: i64,
        granularity_seconds: i64,
        ignore_empty_windows: bool,
    ) -> Self {
        Self {
            window_size_seconds,
            granularity_seconds,
            ignore_empty_windows,
            ..Default::default()
        }
    }

    /// Hourly windows sliding every five minutes
    #[must_use]
    pub fn hourly() -> Self {
        Self::new(60 * 60, 5 * 60, false)
    }

    /// Daily windows sliding every hour, quiet hours excluded from the baseline
    #[must_use]
    pub fn daily() -> Self {
        Self::new(24 * 60 * 60, 60 * 60, true)
    }

    /// Builder: set unknown token policy
    #[must_use]
    pub const fn unknown_tokens(mut self, policy: UnknownTokenPolicy) -> Self {
        self.unknown_tokens = policy;
        self
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|err| TrendingError::invalid_config(format!("TOML parse error: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_size_seconds <= 0 {
            return Err(TrendingError::invalid_config(format!(
                "window_size_seconds must be > 0, got {}",
                self.window_size_seconds
            )));
        }

        if self.granularity_seconds <= 0 {
            return Err(TrendingError::invalid_config(format!(
                "granularity_seconds must be > 0, got {}",
                self.granularity_seconds
            )));
        }

        if self.granularity_seconds > self.window_size_seconds {
            return Err(TrendingError::invalid_config(format!(
                "granularity_seconds ({}) cannot exceed window_size_seconds ({})",
                self.granularity_seconds, self.window_size_seconds
            )));
        }

        Ok(())
    }
}

/// Handling of current-batch tokens that never appeared in the baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTokenPolicy {
    /// Report the token with a z-score of 0
    #[default]
    Zero,

    /// Leave the token out of the result
    Skip,

    /// Fail the whole call with `TrendingError::UnknownToken`
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(TrendingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_preset_configs_valid() {
        assert!(TrendingConfig::hourly().validate().is_ok());
        assert!(TrendingConfig::daily().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        // Invalid: granularity > window
        assert!(TrendingConfig::new(60, 61, false).validate().is_err());

        // Invalid: non-positive values
        assert!(TrendingConfig::new(0, 0, false).validate().is_err());
        assert!(TrendingConfig::new(60, 0, false).validate().is_err());
        assert!(TrendingConfig::new(-60, 15, false).validate().is_err());
        assert!(TrendingConfig::new(60, -15, false).validate().is_err());

        // Valid: granularity == window gives tumbling windows
        assert!(TrendingConfig::new(60, 60, false).validate().is_ok());
        assert!(TrendingConfig::new(60, 15, true).validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = TrendingConfig::from_toml_str(
            r#"
            window_size_seconds = 60
            granularity_seconds = 15
            unknown_tokens = "skip"
            "#,
        )
        .unwrap();
        assert_eq!(config.window_size_seconds, 60);
        assert_eq!(config.granularity_seconds, 15);
        assert!(!config.ignore_empty_windows);
        assert_eq!(config.unknown_tokens, UnknownTokenPolicy::Skip);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let err =
            TrendingConfig::from_toml_str("window_size_seconds = 10\ngranularity_seconds = 20")
                .unwrap_err();
        assert!(matches!(err, TrendingError::InvalidConfig(_)));

        // Non-integer values are a parse error, not a silent truncation
        let err = TrendingConfig::from_toml_str("window_size_seconds = 1.5").unwrap_err();
        assert!(matches!(err, TrendingError::InvalidConfig(_)));

        let err = TrendingConfig::from_toml_str("window_seconds = 60").unwrap_err();
        assert!(matches!(err, TrendingError::InvalidConfig(_)));
    }
}
