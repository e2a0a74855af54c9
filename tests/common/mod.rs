#![allow(dead_code)]

use otpgate::{
    auth::AuthSession,
    flow::{AuthResult, BusyFlag, DataTokenId, LoginFlow, TokenizeError, Tokenizer},
    provider::{ChallengeOutcome, IdentityProvider, PendingChallenge, ProviderError},
};
use secrecy::SecretString;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

pub const ACCESS_TOKEN: &str = "fake-access-token";

/// Scripted provider reply.
#[derive(Debug, Clone)]
pub enum Script {
    Challenge,
    Done,
    /// Challenge accepted but no session was issued.
    DoneWithoutSession,
    Next(&'static str),
    Reject(&'static str, &'static str),
    /// Rejection with an empty message.
    RejectSilently(&'static str),
}

#[derive(Default)]
struct Inner {
    sign_in: VecDeque<Script>,
    confirm: VecDeque<Script>,
    token: Option<String>,
    calls: Vec<String>,
    busy: Option<BusyFlag>,
    busy_seen: Vec<bool>,
    sign_out_fails: bool,
    session_fails: bool,
}

/// In-memory identity provider. Clones share state so a test can keep a
/// handle after moving one into the flow.
#[derive(Clone, Default)]
pub struct FakeProvider {
    inner: Arc<Mutex<Inner>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that already holds a live session.
    pub fn signed_in() -> Self {
        let provider = Self::default();
        provider.lock().token = Some(ACCESS_TOKEN.to_string());
        provider
    }

    pub fn on_sign_in(self, script: Script) -> Self {
        self.lock().sign_in.push_back(script);
        self
    }

    pub fn on_confirm(self, script: Script) -> Self {
        self.lock().confirm.push_back(script);
        self
    }

    /// Session lookups fail while the user lookup keeps working.
    pub fn failing_session(self) -> Self {
        self.lock().session_fails = true;
        self
    }

    pub fn failing_sign_out(self) -> Self {
        self.lock().sign_out_fails = true;
        self
    }

    /// Records the value of `flag` at the start of every provider call.
    pub fn observe(&self, flag: BusyFlag) {
        self.lock().busy = Some(flag);
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn busy_seen(&self) -> Vec<bool> {
        self.lock().busy_seen.clone()
    }

    pub fn has_session(&self) -> bool {
        self.lock().token.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    fn record(&self, call: String) {
        let mut inner = self.lock();
        let busy = inner.busy.as_ref().map(BusyFlag::is_busy);
        if let Some(busy) = busy {
            inner.busy_seen.push(busy);
        }
        inner.calls.push(call);
    }

    fn reply_sign_in(&self, username: &str) -> Result<PendingChallenge, ProviderError> {
        let script = self.lock().sign_in.pop_front().unwrap_or(Script::Challenge);

        match script {
            Script::Reject(kind, message) => Err(rejected(kind, message)),
            Script::RejectSilently(kind) => Err(rejected(kind, "")),
            _ => Ok(challenge("EMAIL_OTP", username)),
        }
    }

    fn reply_confirm(&self, challenge_in: &PendingChallenge) -> Result<ChallengeOutcome, ProviderError> {
        let script = self.lock().confirm.pop_front().unwrap_or(Script::Done);

        match script {
            Script::Done | Script::Challenge => {
                self.lock().token = Some(ACCESS_TOKEN.to_string());
                Ok(ChallengeOutcome::Done)
            }
            Script::DoneWithoutSession => Ok(ChallengeOutcome::Done),
            Script::Next(name) => Ok(ChallengeOutcome::NextChallenge(challenge(
                name,
                challenge_in.username(),
            ))),
            Script::Reject(kind, message) => Err(rejected(kind, message)),
            Script::RejectSilently(kind) => Err(rejected(kind, "")),
        }
    }
}

impl IdentityProvider for FakeProvider {
    async fn sign_in(&self, username: &str) -> Result<PendingChallenge, ProviderError> {
        self.record(format!("sign_in:{username}"));
        tokio::task::yield_now().await;
        self.reply_sign_in(username)
    }

    async fn confirm_sign_in(
        &self,
        challenge: &PendingChallenge,
        response: &str,
    ) -> Result<ChallengeOutcome, ProviderError> {
        self.record(format!("confirm:{}:{response}", challenge.name()));
        tokio::task::yield_now().await;
        self.reply_confirm(challenge)
    }

    async fn fetch_session(&self) -> Result<Option<SecretString>, ProviderError> {
        self.record("fetch_session".to_string());
        let inner = self.lock();
        if inner.session_fails {
            return Err(rejected("InternalErrorException", "session store unavailable"));
        }
        Ok(inner.token.clone().map(SecretString::from))
    }

    async fn current_user(&self) -> Result<String, ProviderError> {
        self.record("current_user".to_string());
        if self.lock().token.is_some() {
            Ok("alice".to_string())
        } else {
            Err(ProviderError::NoSession)
        }
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.record("sign_out".to_string());
        let mut inner = self.lock();
        inner.token = None;
        if inner.sign_out_fails {
            return Err(rejected("InternalErrorException", "sign-out failed"));
        }
        Ok(())
    }
}

/// Tokenizer that answers immediately.
#[derive(Clone, Default)]
pub struct FakeTokenizer {
    failure: Option<&'static str>,
    busy: Arc<Mutex<Option<BusyFlag>>>,
    busy_seen: Arc<Mutex<Vec<bool>>>,
    cards: Arc<Mutex<Vec<String>>>,
}

impl FakeTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &'static str) -> Self {
        Self {
            failure: Some(message),
            ..Self::default()
        }
    }

    pub fn observe(&self, flag: BusyFlag) {
        *self.busy.lock().unwrap() = Some(flag);
    }

    pub fn busy_seen(&self) -> Vec<bool> {
        self.busy_seen.lock().unwrap().clone()
    }

    pub fn cards(&self) -> Vec<String> {
        self.cards.lock().unwrap().clone()
    }

    fn record(&self, card_number: &str) {
        if let Some(flag) = self.busy.lock().unwrap().as_ref() {
            self.busy_seen.lock().unwrap().push(flag.is_busy());
        }
        self.cards.lock().unwrap().push(card_number.to_string());
    }
}

impl Tokenizer for FakeTokenizer {
    async fn tokenize(
        &self,
        _access_token: &SecretString,
        card_number: &str,
    ) -> Result<DataTokenId, TokenizeError> {
        self.record(card_number);
        tokio::task::yield_now().await;

        match self.failure {
            Some(message) => Err(TokenizeError::Rejected(message.to_string())),
            None => Ok(DataTokenId::generate()),
        }
    }
}

/// Handler results shared with the test.
pub type Emitted = Arc<Mutex<Vec<AuthResult>>>;

/// Builds a flow whose success handler appends to the returned list.
pub fn flow(
    provider: &FakeProvider,
    tokenizer: &FakeTokenizer,
) -> (LoginFlow<FakeProvider, FakeTokenizer>, Emitted) {
    let emitted: Emitted = Arc::default();
    let sink = Arc::clone(&emitted);

    let flow = LoginFlow::new(
        AuthSession::new(provider.clone()),
        tokenizer.clone(),
        move |result| sink.lock().unwrap().push(result),
    );

    provider.observe(flow.busy_flag());
    tokenizer.observe(flow.busy_flag());

    (flow, emitted)
}

pub fn challenge(name: &str, username: &str) -> PendingChallenge {
    let mut parameters = HashMap::new();
    parameters.insert(
        "CODE_DELIVERY_DESTINATION".to_string(),
        "a***@e***".to_string(),
    );

    PendingChallenge::new(name, username, SecretString::from("session".to_string()))
        .with_parameters(parameters)
}

pub fn rejected(kind: &str, message: &str) -> ProviderError {
    ProviderError::Rejected {
        kind: kind.to_string(),
        message: message.to_string(),
    }
}
