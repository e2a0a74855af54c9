//! Identity provider seam. The login only needs challenge-based sign-in,
//! challenge confirmation, session fetch, current-user lookup and sign-out;
//! everything about the wire protocol stays behind [`IdentityProvider`].
//! Challenge sessions and access tokens are secrets and must never be logged.

pub mod cognito;

pub use self::cognito::CognitoClient;

use crate::config::ConfigError;
use secrecy::SecretString;
use std::{collections::HashMap, future::Future};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with an error document.
    #[error("{message}")]
    Rejected { kind: String, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected provider response: {0}")]
    MalformedResponse(String),

    #[error("no signed-in user")]
    NoSession,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    /// Provider error kind, e.g. `CodeMismatchException`.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Rejected { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Challenge issued by "begin sign-in" and answered by "confirm challenge".
#[derive(Debug, Clone)]
pub struct PendingChallenge {
    name: String,
    username: String,
    session: SecretString,
    parameters: HashMap<String, String>,
}

impl PendingChallenge {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        session: SecretString,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            session,
            parameters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: HashMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Challenge name, e.g. `EMAIL_OTP`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn session(&self) -> &SecretString {
        &self.session
    }

    /// Non-secret hints sent with the challenge, e.g. the masked destination.
    #[must_use]
    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }
}

/// Result of answering a challenge.
#[derive(Debug, Clone)]
pub enum ChallengeOutcome {
    /// Sign-in is complete and the provider holds a session.
    Done,
    /// The provider wants another step before issuing a session.
    NextChallenge(PendingChallenge),
}

impl ChallengeOutcome {
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Operations the login consumes from a managed identity service.
pub trait IdentityProvider: Send + Sync {
    /// Starts a sign-in for `username`, asking for an out-of-band email code.
    fn sign_in(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<PendingChallenge, ProviderError>> + Send;

    /// Answers `challenge` with the user's `response`.
    fn confirm_sign_in(
        &self,
        challenge: &PendingChallenge,
        response: &str,
    ) -> impl Future<Output = Result<ChallengeOutcome, ProviderError>> + Send;

    /// Access token of the current session, `None` when nobody is signed in.
    fn fetch_session(
        &self,
    ) -> impl Future<Output = Result<Option<SecretString>, ProviderError>> + Send;

    /// Username of the signed-in user.
    fn current_user(&self) -> impl Future<Output = Result<String, ProviderError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;
}
