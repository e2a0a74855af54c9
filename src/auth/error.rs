use crate::provider::ProviderError;
use thiserror::Error;

/// Provider error kinds that mean the submitted code was wrong or stale.
const REJECTED_RESPONSES: [&str; 3] = [
    "CodeMismatchException",
    "ExpiredCodeException",
    "NotAuthorizedException",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Sign-in or challenge failure, message passed through from the provider.
    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    InvalidChallengeResponse(String),

    #[error("No authentication token")]
    NoActiveSession,
}

impl AuthError {
    /// Maps a failure of "confirm challenge", where a rejected code is its own case.
    pub(crate) fn from_challenge(err: ProviderError) -> Self {
        match err.kind() {
            Some(kind) if REJECTED_RESPONSES.contains(&kind) => {
                Self::InvalidChallengeResponse(err.to_string())
            }
            _ => Self::from(err),
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NoSession => Self::NoActiveSession,
            other => Self::Provider(other.to_string()),
        }
    }
}
