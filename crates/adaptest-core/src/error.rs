//! Assessment error types.
//!
//! Grading and recommendation never fail on malformed answers or content;
//! these errors cover rejected preconditions and placement session misuse.

use thiserror::Error;

/// Errors surfaced synchronously by the assessment core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssessmentError {
    /// Scoring was requested for an assessment with zero items.
    #[error("assessment '{0}' has no items")]
    EmptyAssessment(String),

    /// The grade band is not one of the known bands.
    #[error("unknown grade band: {0}")]
    UnknownGradeBand(String),

    /// Other rejected caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The placement session does not exist or has expired.
    #[error("placement session not found or expired: {0}")]
    SessionNotFound(String),

    /// `finalize` was already called for this placement session.
    #[error("placement session already finalized: {0}")]
    AlreadyFinalized(String),

    /// The placement session already holds an assessment result.
    #[error("placement session already has a recorded result: {0}")]
    ResultAlreadyRecorded(String),
}

impl AssessmentError {
    /// Returns `true` for caller input errors (the validation family).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AssessmentError::EmptyAssessment(_)
                | AssessmentError::UnknownGradeBand(_)
                | AssessmentError::InvalidInput(_)
        )
    }

    /// Returns `true` if the error concerns a placement session's lifecycle.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            AssessmentError::SessionNotFound(_)
                | AssessmentError::AlreadyFinalized(_)
                | AssessmentError::ResultAlreadyRecorded(_)
        )
    }
}
