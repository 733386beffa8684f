use thiserror::Error;

use crate::backend::BackendError;
use crate::engine::RetryError;

/// Why a single candidate fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    /// Transport-level failure or an unexpected HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The source has nothing left to offer.
    #[error("no candidate available: {0}")]
    EmptyResult(String),

    /// The response is missing a field needed to render the card.
    #[error("malformed candidate: {0}")]
    MalformedResult(String),
}

impl From<BackendError> for CandidateError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => CandidateError::MalformedResult(msg),
            other => CandidateError::Network(other.to_string()),
        }
    }
}

/// Why a single decision write failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),

    #[error("decision rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<BackendError> for SubmitError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status { status, message } => SubmitError::Rejected { status, message },
            other => SubmitError::Network(other.to_string()),
        }
    }
}

/// Coarse failure classification handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Network,
    EmptyResult,
    MalformedResult,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "Could not reach the server"),
            ErrorKind::EmptyResult => write!(f, "You have already rated every available movie"),
            ErrorKind::MalformedResult => write!(f, "The server sent an incomplete movie"),
            ErrorKind::Cancelled => write!(f, "Session stopped"),
        }
    }
}

impl From<&CandidateError> for ErrorKind {
    fn from(err: &CandidateError) -> Self {
        match err {
            CandidateError::Network(_) => ErrorKind::Network,
            CandidateError::EmptyResult(_) => ErrorKind::EmptyResult,
            CandidateError::MalformedResult(_) => ErrorKind::MalformedResult,
        }
    }
}

impl From<&RetryError<CandidateError>> for ErrorKind {
    fn from(err: &RetryError<CandidateError>) -> Self {
        match err {
            RetryError::Exhausted { last, .. } => ErrorKind::from(last),
            RetryError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}
