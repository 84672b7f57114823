use chrono::{DateTime, Utc};
use thiserror::Error;

/// Rejected before an item enters the authoritative store. Never partially
/// applied: a failed validation leaves the store untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("item title must not be empty")]
    MissingTitle,
    #[error("item end {end} is before start {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("progress {0} is outside [0, 1]")]
    ProgressOutOfRange(f32),
}

/// A fetch failure, isolated to the request that raised it. Already-cached
/// data stays usable and the engine keeps rendering the last good state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataSourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("data source request timed out")]
    Timeout,
}
