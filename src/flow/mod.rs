//! Login flow state machine.
//!
//! The flow walks a user through `Email -> OneTimeCode -> CardCapture ->
//! Success`, calling the [`AuthSession`] facade on every submission. The only
//! backward edge is "back" from `OneTimeCode` to `Email`, which drops the
//! pending challenge. A failed submission stays on its step and fills the
//! error slot; nothing is retried automatically.
//!
//! Each submission holds the [`BusyFlag`] from before its first provider call
//! until it settles. A host renders the submit control from
//! [`LoginFlow::can_submit`], which is false while busy.
//!
//! On reaching `Success` the flow hands an [`AuthResult`] to the handler given
//! at construction, exactly once.

mod busy;
mod state;
pub mod tokenize;

pub use self::busy::{BusyFlag, BusyGuard};
pub use self::state::{
    sanitize_card_number, sanitize_code, FlowState, CARD_MAX_DIGITS, CARD_MIN_DIGITS,
    CODE_MAX_LEN,
};
pub use self::tokenize::{DataTokenId, SimulatedTokenizer, TokenizeError, Tokenizer};

use crate::{
    auth::{AuthError, AuthSession},
    provider::{ChallengeOutcome, IdentityProvider, PendingChallenge},
};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info};

const SEND_CODE_FAILED: &str = "Failed to send OTP";
const INVALID_CODE: &str = "Invalid OTP code";
const CARD_FAILED: &str = "Failed to process card";

/// Terminal output of the login.
#[derive(Debug)]
pub struct AuthResult {
    pub access_token: SecretString,
    /// `None` when an existing session skipped the card step.
    pub data_token_id: Option<DataTokenId>,
}

pub type SuccessHandler = Box<dyn FnOnce(AuthResult) + Send>;

/// Misuse of the flow API. Step failures go to [`LoginFlow::error`] instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    #[error("{action} is not available in the {state} step")]
    WrongStep {
        action: &'static str,
        state: FlowState,
    },

    #[error("submit is disabled in the {0} step")]
    SubmitDisabled(FlowState),
}

enum Step {
    Email,
    OneTimeCode { challenge: PendingChallenge },
    CardCapture,
    Success,
}

impl Step {
    fn state(&self) -> FlowState {
        match self {
            Self::Email => FlowState::Email,
            Self::OneTimeCode { .. } => FlowState::OneTimeCode,
            Self::CardCapture => FlowState::CardCapture,
            Self::Success => FlowState::Success,
        }
    }
}

pub struct LoginFlow<P, T> {
    auth: AuthSession<P>,
    tokenizer: T,
    step: Step,
    email: String,
    code: String,
    card_number: String,
    error: Option<String>,
    busy: BusyFlag,
    on_success: Option<SuccessHandler>,
}

impl<P, T> LoginFlow<P, T>
where
    P: IdentityProvider,
    T: Tokenizer,
{
    pub fn new<F>(auth: AuthSession<P>, tokenizer: T, on_success: F) -> Self
    where
        F: FnOnce(AuthResult) + Send + 'static,
    {
        Self {
            auth,
            tokenizer,
            step: Step::Email,
            email: String::new(),
            code: String::new(),
            card_number: String::new(),
            error: None,
            busy: BusyFlag::new(),
            on_success: Some(Box::new(on_success)),
        }
    }

    pub fn state(&self) -> FlowState {
        self.step.state()
    }

    pub fn auth(&self) -> &AuthSession<P> {
        &self.auth
    }

    /// Current error message, cleared when the next submission starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Handle to the busy flag for hosts that render outside the flow.
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    /// Where the provider says the code went, if it said.
    pub fn code_destination(&self) -> Option<&str> {
        match &self.step {
            Step::OneTimeCode { challenge } => challenge
                .parameters()
                .get("CODE_DELIVERY_DESTINATION")
                .map(String::as_str),
            _ => None,
        }
    }

    pub fn set_email(&mut self, value: &str) {
        self.email = value.to_string();
    }

    pub fn set_code(&mut self, value: &str) {
        self.code = sanitize_code(value);
    }

    pub fn set_card_number(&mut self, value: &str) {
        self.card_number = sanitize_card_number(value);
    }

    /// Whether the current step's submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && self.input_ready()
    }

    fn input_ready(&self) -> bool {
        match self.step {
            Step::Email => !self.email.trim().is_empty(),
            Step::OneTimeCode { .. } => !self.code.is_empty(),
            Step::CardCapture => self.card_number.len() >= CARD_MIN_DIGITS,
            Step::Success => false,
        }
    }

    /// Entry guard, run once before the first render. A user with a live
    /// session goes straight to `Success` without a data token.
    pub async fn mount(&mut self) -> FlowState {
        if !matches!(self.step, Step::Email) {
            return self.state();
        }

        if self.auth.is_authenticated().await {
            if let Some(access_token) = self.auth.get_access_token().await {
                info!("existing session found, skipping login");

                self.transition(Step::Success);
                self.emit(AuthResult {
                    access_token,
                    data_token_id: None,
                });
            }
        }

        self.state()
    }

    /// Requests a one-time code for the entered email.
    /// # Errors
    /// Returns a [`FlowError`] if the flow is not on the email step or submit is disabled.
    pub async fn submit_email(&mut self) -> Result<FlowState, FlowError> {
        self.expect(FlowState::Email, "submit email")?;
        let _busy = self.begin_submit()?;

        let email = self.email.trim().to_string();

        match self.auth.begin_sign_in(&email).await {
            Ok(challenge) => {
                self.code.clear();
                self.transition(Step::OneTimeCode { challenge });
            }
            Err(e) => self.fail(&e, SEND_CODE_FAILED),
        }

        Ok(self.state())
    }

    /// Answers the pending challenge with the entered code.
    /// # Errors
    /// Returns a [`FlowError`] if the flow is not on the code step or submit is disabled.
    pub async fn submit_code(&mut self) -> Result<FlowState, FlowError> {
        let challenge = match &self.step {
            Step::OneTimeCode { challenge } => challenge.clone(),
            _ => return Err(self.wrong_step("submit code")),
        };
        let _busy = self.begin_submit()?;

        match self.auth.confirm_challenge(&challenge, &self.code).await {
            Ok(ChallengeOutcome::Done) => {
                if self.auth.get_access_token().await.is_some() {
                    self.code.clear();
                    self.transition(Step::CardCapture);
                } else {
                    self.fail(&AuthError::NoActiveSession, INVALID_CODE);
                }
            }
            Ok(ChallengeOutcome::NextChallenge(next)) => {
                let message = format!("Additional sign-in step required: {}", next.name());
                self.step = Step::OneTimeCode { challenge: next };
                self.fail(&message, INVALID_CODE);
            }
            Err(e) => self.fail(&e, INVALID_CODE),
        }

        Ok(self.state())
    }

    /// Returns to the email step, discarding the pending challenge.
    /// # Errors
    /// Returns [`FlowError::WrongStep`] outside the code step.
    pub fn back(&mut self) -> Result<FlowState, FlowError> {
        self.expect(FlowState::OneTimeCode, "back")?;

        self.error = None;
        self.code.clear();
        self.transition(Step::Email);

        Ok(self.state())
    }

    /// Tokenizes the entered card and completes the login.
    /// # Errors
    /// Returns a [`FlowError`] if the flow is not on the card step or submit is disabled.
    pub async fn submit_card(&mut self) -> Result<FlowState, FlowError> {
        self.expect(FlowState::CardCapture, "submit card")?;
        let _busy = self.begin_submit()?;

        match self.capture_card().await {
            Ok(result) => {
                self.card_number.clear();
                self.transition(Step::Success);
                self.emit(result);
            }
            Err(e) => self.fail(&e, CARD_FAILED),
        }

        Ok(self.state())
    }

    async fn capture_card(&self) -> anyhow::Result<AuthResult> {
        let access_token = self
            .auth
            .get_access_token()
            .await
            .ok_or(AuthError::NoActiveSession)?;

        let data_token_id = self
            .tokenizer
            .tokenize(&access_token, &self.card_number)
            .await?;

        Ok(AuthResult {
            access_token,
            data_token_id: Some(data_token_id),
        })
    }

    fn expect(&self, state: FlowState, action: &'static str) -> Result<(), FlowError> {
        if self.state() == state {
            Ok(())
        } else {
            Err(self.wrong_step(action))
        }
    }

    fn wrong_step(&self, action: &'static str) -> FlowError {
        FlowError::WrongStep {
            action,
            state: self.state(),
        }
    }

    fn begin_submit(&mut self) -> Result<BusyGuard, FlowError> {
        let disabled = FlowError::SubmitDisabled(self.state());

        if !self.input_ready() {
            return Err(disabled);
        }

        let guard = self.busy.try_acquire().ok_or(disabled)?;
        self.error = None;

        Ok(guard)
    }

    fn fail(&mut self, err: &dyn std::fmt::Display, fallback: &str) {
        let message = err.to_string();
        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };

        debug!("{} step failed: {}", self.state(), message);

        self.error = Some(message);
    }

    fn transition(&mut self, next: Step) {
        debug!("flow transition: {} -> {}", self.state(), next.state());
        self.step = next;
    }

    fn emit(&mut self, result: AuthResult) {
        if let Some(on_success) = self.on_success.take() {
            on_success(result);
        }
    }
}
