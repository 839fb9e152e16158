use thiserror::Error;

/// Raised when an incoming row breaks an invariant the record store enforces.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("rating {0} is outside 1..=5")]
    RatingOutOfRange(i32),

    #[error("{field} score {value} is outside 1..=10")]
    ScoreOutOfRange { field: &'static str, value: i32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("PEERPULSE_MAX_CONNECTIONS must be between 1 and 100, got {0}")]
    PoolSizeOutOfRange(u32),
}
