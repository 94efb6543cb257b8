//! Error types for the chart engine
//!
//! Every failure is local to one input and recoverable: a rejected load,
//! search or page selection leaves the session exactly as it was.

use thiserror::Error;

/// Errors surfaced by ingestion and the correlation engine
#[derive(Error, Debug)]
pub enum ChartError {
    /// Input arrived with the wrong shape; nothing from the batch was applied.
    #[error("Malformed input: {reason}")]
    Structural { reason: String },

    #[error("Duplicate closeTime {close_time} at positions {first} and {second}")]
    DuplicateKey {
        close_time: i64,
        first: usize,
        second: usize,
    },

    #[error("Timestamp {timestamp} not found in loaded candles")]
    LookupMiss { timestamp: i64 },

    #[error("Page {page} is not available ({available} pages)")]
    PageUnavailable { page: i64, available: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ChartError {
    pub fn structural(reason: impl Into<String>) -> Self {
        ChartError::Structural {
            reason: reason.into(),
        }
    }

    /// Misses are expected operator mistakes, not faults.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            ChartError::LookupMiss { .. } | ChartError::PageUnavailable { .. }
        )
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
