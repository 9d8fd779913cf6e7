use std::time::Duration;

use thiserror::Error;

/// Why a single poll of the upstream feed produced no snapshot.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed returned HTTP {0}")]
    Status(u16),

    #[error("feed call exceeded {0:?}")]
    Timeout(Duration),

    #[error("feed file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("feed transport panicked")]
    Panicked,
}

impl FeedError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Status(_) => "status",
            Self::Timeout(_) => "timeout",
            Self::Io(_) => "io",
            Self::Panicked => "panicked",
        }
    }
}

/// Rejection of raw admin input before it reaches the adjustment engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdjustmentInputError {
    #[error("adjustment amount {0:?} is not a number")]
    NotANumber(String),

    #[error("adjustment amount must be positive, got {0}")]
    NotPositive(String),

    #[error("unknown adjustment scope {0:?}")]
    UnknownScope(String),

    #[error("unknown adjustment mode {0:?}")]
    UnknownMode(String),

    #[error("unknown adjustment direction {0:?}")]
    UnknownDirection(String),
}
