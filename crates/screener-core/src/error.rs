use crate::types::FundamentalField;
use thiserror::Error;

/// Rejection kinds produced by the instrument validation pipeline.
///
/// Business-rule rejections (eligibility, classification, identifier
/// format) are distinct from schema rejections so callers can log them at
/// different severities. Any of these is terminal for the single record
/// only; a batch skips the record and continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("instrument is not ISA eligible")]
    EligibilityRejected,

    #[error("fund-like instrument excluded ({0})")]
    ClassificationRejected(String),

    #[error("ISIN format invalid: {0}")]
    IdentifierFormatInvalid(String),

    #[error("record schema invalid: {0}")]
    SchemaInvalid(String),
}

impl ValidationError {
    /// True for shape problems (missing field, wrong type), false for
    /// business-rule rejections. Callers log the former at warn and the
    /// latter at info.
    pub fn is_schema_failure(&self) -> bool {
        matches!(self, ValidationError::SchemaInvalid(_))
    }
}

/// Scoring failure: a required fundamental series is absent from the
/// fetched data. Distinct from a zero score, which is a valid outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("fundamental series unavailable: {}", .0.api_name())]
    FieldUnavailable(FundamentalField),
}

/// Failures from external data sources (sheet export, fundamentals
/// endpoint). Timeouts are distinguishable so a batch can skip-and-continue
/// on a slow symbol without treating it like a malformed response.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("malformed response: {0}")]
    Decode(String),
}
