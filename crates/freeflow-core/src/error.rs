use thiserror::Error;

/// Validation and contract errors exposed by `freeflow-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or digit: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid periodicity '{value}', expected one of quarterly, annual")]
    InvalidPeriodicity { value: String },
    #[error("invalid source '{value}', expected one of yahoo, alphavantage, fixture")]
    InvalidSource { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z) or YYYY-MM-DD: '{value}'")]
    TimestampNotUtc { value: String },

    #[error("period start {start} must be before its end {end}")]
    InvertedPeriod { start: String, end: String },
    #[error("periods must be ordered by end descending: {previous} is not after {next}")]
    UnorderedPeriods { previous: String, next: String },
    #[error("period ending {newer} overlaps the period ending {older}")]
    OverlappingPeriods { newer: String, older: String },

    #[error("alias table version cannot be empty")]
    EmptyAliasVersion,
    #[error("alias list for '{field}' must contain at least one non-blank alias")]
    EmptyAliasList { field: &'static str },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
