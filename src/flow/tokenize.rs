//! Card tokenization seam. [`SimulatedTokenizer`] is a stand-in: it does not
//! talk to any vault, it waits and makes up a `dt_` identifier. A real vault
//! integration implements [`Tokenizer`] instead.

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, future::Future, time::Duration};
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

const DATA_TOKEN_PREFIX: &str = "dt_";
const DATA_TOKEN_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("No authentication token")]
    Unauthorized,

    #[error("{0}")]
    Rejected(String),
}

/// Opaque reference to a tokenized card.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataTokenId(String);

impl DataTokenId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `dt_` followed by nine random base-36 characters.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..DATA_TOKEN_LEN)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect();

        Self(format!("{DATA_TOKEN_PREFIX}{suffix}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait Tokenizer: Send + Sync {
    /// Exchanges `card_number` for a data token on behalf of the session owning `access_token`.
    fn tokenize(
        &self,
        access_token: &SecretString,
        card_number: &str,
    ) -> impl Future<Output = Result<DataTokenId, TokenizeError>> + Send;
}

/// Simulated tokenization: no vault call, a fixed delay and a random id.
#[derive(Debug, Clone)]
pub struct SimulatedTokenizer {
    delay: Duration,
}

impl SimulatedTokenizer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedTokenizer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Tokenizer for SimulatedTokenizer {
    async fn tokenize(
        &self,
        access_token: &SecretString,
        _card_number: &str,
    ) -> Result<DataTokenId, TokenizeError> {
        if access_token.expose_secret().is_empty() {
            return Err(TokenizeError::Unauthorized);
        }

        sleep(self.delay).await;

        let id = DataTokenId::generate();

        debug!("simulated data token {}", id);

        Ok(id)
    }
}
