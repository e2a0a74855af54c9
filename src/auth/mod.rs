//! Auth session facade. Wraps an [`IdentityProvider`] and exposes the five
//! operations the login flow needs, normalizing provider results. Sign-out
//! and the authenticated check never fail; session lookup reports "not signed
//! in" as `None` and only logs provider trouble.

mod error;

pub use self::error::AuthError;

use crate::provider::{ChallengeOutcome, IdentityProvider, PendingChallenge};
use secrecy::SecretString;
use tracing::{debug, error, warn};

pub struct AuthSession<P> {
    provider: P,
}

impl<P: IdentityProvider> AuthSession<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Starts a challenge-based sign-in, requesting a one-time code by email.
    /// # Errors
    /// Returns [`AuthError::Provider`] with the provider's message if the
    /// identifier is rejected or the provider cannot be reached.
    pub async fn begin_sign_in(&self, identifier: &str) -> Result<PendingChallenge, AuthError> {
        self.provider
            .sign_in(identifier)
            .await
            .map_err(AuthError::from)
    }

    /// Submits the user's code for `challenge`.
    /// # Errors
    /// Returns [`AuthError::InvalidChallengeResponse`] on a wrong or expired
    /// code and [`AuthError::Provider`] for anything else.
    pub async fn confirm_challenge(
        &self,
        challenge: &PendingChallenge,
        response: &str,
    ) -> Result<ChallengeOutcome, AuthError> {
        self.provider
            .confirm_sign_in(challenge, response)
            .await
            .map_err(AuthError::from_challenge)
    }

    /// Bearer token of the current session, `None` if nobody is signed in.
    pub async fn get_access_token(&self) -> Option<SecretString> {
        match self.provider.fetch_session().await {
            Ok(token) => token,
            Err(e) => {
                warn!("No valid auth session found: {}", e);
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        match self.provider.current_user().await {
            Ok(_) => true,
            Err(e) => {
                debug!("not authenticated: {}", e);
                false
            }
        }
    }

    pub async fn sign_out(&self) {
        if let Err(e) = self.provider.sign_out().await {
            error!("Error signing out: {}", e);
        }
    }
}
