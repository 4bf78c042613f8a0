use thiserror::Error;

/// Result type for trending operations
pub type Result<T> = std::result::Result<T, TrendingError>;

/// Errors that can occur while building a baseline or scoring a batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrendingError {
    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No interpreter registered for the object's type tag
    #[error("No interpreter added for type {0}")]
    UnsupportedType(String),

    /// A current-batch document falls entirely before the latest historical window
    #[error(
        "Document at {timestamp} is older than the latest historical window starting at {latest_window_start}"
    )]
    DocumentTooOld {
        timestamp: i64,
        latest_window_start: i64,
    },

    /// Timestamp whose windows cannot be represented in unix seconds
    #[error("Timestamp {0} is out of range for the configured windows")]
    TimestampOutOfRange(i64),

    /// Historical scores for a token have no variation, so a z-score is undefined
    #[error("Degenerate distribution for token {token}: {samples} window(s), standard deviation is zero")]
    DegenerateDistribution { token: String, samples: usize },

    /// A current-batch token has no historical record
    #[error("Token {0} has no historical record")]
    UnknownToken(String),

    /// Token lookup failed
    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// Destination store already owns a token with the same value
    #[error("Token {0} is already present in the destination store")]
    TokenAlreadyPresent(String),

    /// Weight function produced NaN or infinity
    #[error("Invalid weight {weight} for token {token}")]
    InvalidWeight { token: String, weight: f64 },
}

impl TrendingError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an unsupported type error
    pub fn unsupported_type(tag: impl Into<String>) -> Self {
        Self::UnsupportedType(tag.into())
    }

    /// True when scoring failed only because the baseline had no variation.
    ///
    /// Callers usually treat this as "not trending" rather than a hard failure.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateDistribution { .. })
    }
}
