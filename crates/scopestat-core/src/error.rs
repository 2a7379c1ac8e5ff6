//! Shared error type across scopestat crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Unified error type used by the core and the exporter.
///
/// `Clone` so that sink failures can be fanned out on the store's
/// broadcast error channel.
#[derive(Debug, Clone, Error)]
pub enum StatsError {
    #[error("invalid tag extractor {name}: {reason}")]
    InvalidTagExtractor { name: String, reason: String },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("sink {sink} failed: {reason}")]
    Sink { sink: String, reason: String },
    #[error("io: {0}")]
    Io(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl StatsError {
    /// Stable string code, safe to expose to operators and HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            StatsError::InvalidTagExtractor { .. } => "INVALID_TAG_EXTRACTOR",
            StatsError::BadConfig(_) => "BAD_CONFIG",
            StatsError::Sink { .. } => "SINK",
            StatsError::Io(_) => "IO",
            StatsError::Internal(_) => "INTERNAL",
        }
    }

    /// Wrap an arbitrary failure as a sink error.
    pub fn sink(sink: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        StatsError::Sink {
            sink: sink.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for StatsError {
    fn from(e: std::io::Error) -> Self {
        StatsError::Io(e.to_string())
    }
}
