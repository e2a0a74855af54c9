//! Cognito user-pool client for the passwordless `USER_AUTH` flow with an
//! `EMAIL_OTP` challenge. Requests are unauthenticated JSON 1.1 calls against
//! the regional `cognito-idp` endpoint; issued tokens live only in memory.

use super::{ChallengeOutcome, IdentityProvider, PendingChallenge, ProviderError};
use crate::{config::CognitoConfig, APP_USER_AGENT};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::{collections::HashMap, time::Duration};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info_span, instrument, Instrument};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// `AuthenticationResult` of a completed challenge.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    expires_in: Option<u64>,
}

/// Error document returned with a non-2xx status.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

struct Session {
    access_token: SecretString,
    expires_at: Instant,
}

pub struct CognitoClient {
    http: Client,
    endpoint: String,
    client_id: String,
    session: Mutex<Option<Session>>,
}

impl CognitoClient {
    /// Builds a client for the configured user pool.
    /// # Errors
    /// Returns an error if the endpoint cannot be derived or the HTTP client cannot be built.
    pub fn new(config: &CognitoConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().user_agent(APP_USER_AGENT).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint()?,
            client_id: config.user_pool_client_id.clone(),
            session: Mutex::new(None),
        })
    }

    async fn call(&self, operation: &str, payload: &Value) -> Result<Value, ProviderError> {
        let span = info_span!(
            "cognito.request",
            http.method = "POST",
            operation,
            url = %self.endpoint
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(payload.to_string())
            .send()
            .instrument(span)
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(rejection(status, &body));
        }

        let body = response.text().await?;

        if body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }

    async fn store_session(&self, result: &Value) -> Result<(), ProviderError> {
        let result = AuthenticationResult::deserialize(result)
            .map_err(|e| ProviderError::MalformedResponse(format!("AuthenticationResult: {e}")))?;

        let access_token = result.access_token;
        let expires_in = result.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);

        let session = Session {
            access_token: SecretString::from(access_token),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        };

        *self.session.lock().await = Some(session);

        debug!("session stored, expires in {} seconds", expires_in);

        Ok(())
    }
}

impl IdentityProvider for CognitoClient {
    #[instrument(skip_all)]
    async fn sign_in(&self, username: &str) -> Result<PendingChallenge, ProviderError> {
        let payload = json!({
            "AuthFlow": "USER_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": {
                "USERNAME": username,
                "PREFERRED_CHALLENGE": "EMAIL_OTP"
            }
        });

        let response = self.call("InitiateAuth", &payload).await?;

        if response.get("AuthenticationResult").is_some() {
            return Err(ProviderError::MalformedResponse(
                "sign-in completed without a challenge".to_string(),
            ));
        }

        let challenge = challenge_from(&response, username)?;

        debug!("challenge issued: {}", challenge.name());

        Ok(challenge)
    }

    #[instrument(skip(self, challenge, response), fields(challenge = challenge.name()))]
    async fn confirm_sign_in(
        &self,
        challenge: &PendingChallenge,
        response: &str,
    ) -> Result<ChallengeOutcome, ProviderError> {
        let mut responses = Map::new();
        responses.insert("USERNAME".to_string(), json!(challenge.username()));
        responses.insert(response_key(challenge.name()).to_string(), json!(response));

        let payload = json!({
            "ChallengeName": challenge.name(),
            "ClientId": self.client_id,
            "Session": challenge.session().expose_secret(),
            "ChallengeResponses": responses
        });

        let answer = self.call("RespondToAuthChallenge", &payload).await?;

        if let Some(result) = answer.get("AuthenticationResult") {
            self.store_session(result).await?;

            return Ok(ChallengeOutcome::Done);
        }

        let next = challenge_from(&answer, challenge.username())?;

        debug!("provider requested another challenge: {}", next.name());

        Ok(ChallengeOutcome::NextChallenge(next))
    }

    async fn fetch_session(&self) -> Result<Option<SecretString>, ProviderError> {
        let mut guard = self.session.lock().await;

        match guard.as_ref() {
            Some(session) if session.expires_at > Instant::now() => {
                Ok(Some(session.access_token.clone()))
            }
            Some(_) => {
                debug!("session expired");
                *guard = None;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<String, ProviderError> {
        let token = self.fetch_session().await?.ok_or(ProviderError::NoSession)?;

        let payload = json!({ "AccessToken": token.expose_secret() });

        let response = self.call("GetUser", &payload).await?;

        response
            .get("Username")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| ProviderError::MalformedResponse("no Username found".to_string()))
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), ProviderError> {
        // the local session goes away even if the global sign-out fails
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };

        let payload = json!({ "AccessToken": session.access_token.expose_secret() });

        self.call("GlobalSignOut", &payload).await?;

        Ok(())
    }
}

/// Challenge response field for a given challenge name.
fn response_key(challenge: &str) -> &'static str {
    match challenge {
        "EMAIL_OTP" => "EMAIL_OTP_CODE",
        "SMS_OTP" => "SMS_OTP_CODE",
        "SMS_MFA" => "SMS_MFA_CODE",
        "SOFTWARE_TOKEN_MFA" => "SOFTWARE_TOKEN_MFA_CODE",
        "NEW_PASSWORD_REQUIRED" => "NEW_PASSWORD",
        _ => "ANSWER",
    }
}

fn challenge_from(response: &Value, username: &str) -> Result<PendingChallenge, ProviderError> {
    let name = response
        .get("ChallengeName")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::MalformedResponse("no ChallengeName found".to_string()))?;

    let session = response
        .get("Session")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::MalformedResponse("no Session found".to_string()))?;

    let parameters: HashMap<String, String> = response
        .get("ChallengeParameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let username = parameters
        .get("USERNAME")
        .cloned()
        .unwrap_or_else(|| username.to_string());

    Ok(
        PendingChallenge::new(name, username, SecretString::from(session.to_string()))
            .with_parameters(parameters),
    )
}

fn rejection(status: StatusCode, body: &str) -> ProviderError {
    let body: ErrorBody = serde_json::from_str(body).unwrap_or(ErrorBody {
        kind: None,
        message: None,
    });

    let kind = body.kind.map_or_else(
        || status.as_u16().to_string(),
        |kind| kind.rsplit('#').next().unwrap_or(&kind).to_string(),
    );

    let message = body.message.unwrap_or_else(|| status.to_string());

    ProviderError::Rejected { kind, message }
}
