use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::wire::problem::Problem;

pub type AcmeResult<T> = Result<T, AcmeError>;

#[derive(Error, Debug)]
pub enum AcmeError {
    /// The server answered with a well-formed problem document.
    #[error("{0}")]
    Problem(Problem),

    /// The server demands agreement to updated terms of service before it
    /// will process further requests.
    #[error("user action required: {problem}")]
    UserActionRequired {
        problem: Problem,
        /// The current terms of service, taken from the cached directory
        /// metadata when available.
        terms_of_service: Option<String>,
    },

    /// The server asked the client to come back later. Not a failure: the
    /// resource state in the response body has already been applied when this
    /// is returned from an `update()`.
    #[error("retry after {0}")]
    RetryAfter(DateTime<Utc>),

    /// Transport-level failure. Retriable at the application layer.
    #[error("http: [{}] {0}", .0.status())]
    Http(http_client::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The server response violated the protocol (malformed document, type
    /// mismatch, unusable directory). Not retriable.
    #[error("protocol: {0}")]
    Protocol(String),

    #[error("missing expected field {0}")]
    MissingField(&'static str),

    #[error("missing expected header {0}")]
    MissingHeader(&'static str),

    #[error(transparent)]
    Crypto(anyhow::Error),

    /// Caller contract violation, such as an empty URL.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Provider resolution failed at session construction.
    #[error("configuration: {0}")]
    Configuration(String),
}

impl AcmeError {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        AcmeError::Protocol(msg.into())
    }

    /// The problem document attached to this error, if the server sent one.
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            AcmeError::Problem(problem) => Some(problem),
            AcmeError::UserActionRequired { problem, .. } => Some(problem),
            _ => None,
        }
    }

    pub fn is_bad_nonce(&self) -> bool {
        self.problem().map(Problem::is_bad_nonce).unwrap_or(false)
    }

    /// Whether retrying the same call later can reasonably succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AcmeError::Http(_) | AcmeError::RetryAfter(_))
    }
}

impl From<http_client::Error> for AcmeError {
    fn from(err: http_client::Error) -> Self {
        AcmeError::Http(err)
    }
}
