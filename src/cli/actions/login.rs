//! Terminal host for the login flow. Each step is rendered as a few lines of
//! text followed by a prompt; the answer is fed to the flow and any error it
//! reports is printed before the step is shown again.

use crate::{
    auth::AuthSession,
    cli::globals::GlobalArgs,
    flow::{AuthResult, FlowState, LoginFlow, SimulatedTokenizer, Tokenizer, CARD_MIN_DIGITS},
    provider::{CognitoClient, IdentityProvider},
};
use anyhow::{anyhow, Context, Result};
use secrecy::ExposeSecret;
use std::io::Write;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    sync::oneshot,
};
use tracing::info;

const BACK: &str = "back";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub sign_out: bool,
}

/// Line-oriented terminal: prompts go to `out`, answers come from `input`.
pub struct Terminal<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// # Errors
    /// Returns an error if the output cannot be written.
    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    /// Prints `label` and waits for one line of input.
    /// # Errors
    /// Returns an error if the input closes or the output cannot be written.
    pub async fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.out, "{label}")?;
        self.out.flush()?;

        self.lines
            .next_line()
            .await?
            .ok_or_else(|| anyhow!("input closed before the login completed"))
    }
}

/// Runs the interactive login against the configured user pool.
/// # Errors
/// Returns an error if the provider client cannot be built or the terminal goes away.
pub async fn execute(args: Args) -> Result<()> {
    let client = CognitoClient::new(&args.globals.cognito)
        .context("Failed to create identity provider client")?;

    let (tx, rx) = oneshot::channel();

    let mut flow = LoginFlow::new(
        AuthSession::new(client),
        SimulatedTokenizer::default(),
        move |result: AuthResult| {
            let _ = tx.send(result);
        },
    );

    let mut terminal = Terminal::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    drive(&mut flow, &mut terminal).await?;

    let result = rx.await.context("login finished without a result")?;

    render_success(&mut terminal, &result)?;

    if args.sign_out {
        flow.auth().sign_out().await;
        terminal.say("Signed out")?;
    }

    Ok(())
}

/// Renders each step and feeds the answers to `flow` until it reaches `Success`.
/// # Errors
/// Returns an error if the terminal input closes first.
pub async fn drive<P, T, R, W>(
    flow: &mut LoginFlow<P, T>,
    terminal: &mut Terminal<R, W>,
) -> Result<()>
where
    P: IdentityProvider,
    T: Tokenizer,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if flow.mount().await == FlowState::Success {
        info!("already signed in");
    }

    loop {
        match flow.state() {
            FlowState::Email => email_step(flow, terminal).await?,
            FlowState::OneTimeCode => code_step(flow, terminal).await?,
            FlowState::CardCapture => card_step(flow, terminal).await?,
            FlowState::Success => return Ok(()),
        }
    }
}

/// # Errors
/// Returns an error if the output cannot be written.
pub fn render_success<R, W>(terminal: &mut Terminal<R, W>, result: &AuthResult) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    terminal.say("")?;
    terminal.say("\u{2713} Authentication Complete")?;

    match &result.data_token_id {
        Some(id) => {
            terminal.say("You're now signed in and your card has been tokenized.")?;
            terminal.say(&format!("Data token: {id}"))?;
        }
        None => terminal.say("You're already signed in.")?,
    }

    terminal.say(&format!(
        "Access token: {}",
        result.access_token.expose_secret()
    ))
}

async fn email_step<P, T, R, W>(
    flow: &mut LoginFlow<P, T>,
    terminal: &mut Terminal<R, W>,
) -> Result<()>
where
    P: IdentityProvider,
    T: Tokenizer,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    terminal.say("")?;
    terminal.say("Sign In")?;
    terminal.say("Enter your email to receive a one-time code.")?;

    let email = terminal.ask("Email: ").await?;
    flow.set_email(&email);

    if !flow.can_submit() {
        return terminal.say("Email is required.");
    }

    terminal.say("Sending...")?;
    flow.submit_email().await?;

    report(flow, terminal)
}

async fn code_step<P, T, R, W>(
    flow: &mut LoginFlow<P, T>,
    terminal: &mut Terminal<R, W>,
) -> Result<()>
where
    P: IdentityProvider,
    T: Tokenizer,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let destination = flow
        .code_destination()
        .unwrap_or_else(|| flow.email())
        .to_string();

    terminal.say("")?;
    terminal.say("Enter Verification Code")?;
    terminal.say(&format!("We sent a code to {destination}"))?;

    let answer = terminal.ask(&format!("Code (or '{BACK}'): ")).await?;

    if answer.trim().eq_ignore_ascii_case(BACK) {
        flow.back()?;
        return Ok(());
    }

    flow.set_code(&answer);

    if !flow.can_submit() {
        return terminal.say("Enter the code from your email.");
    }

    terminal.say("Verifying...")?;
    flow.submit_code().await?;

    report(flow, terminal)
}

async fn card_step<P, T, R, W>(
    flow: &mut LoginFlow<P, T>,
    terminal: &mut Terminal<R, W>,
) -> Result<()>
where
    P: IdentityProvider,
    T: Tokenizer,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    terminal.say("")?;
    terminal.say("Enter Card Details")?;
    terminal.say("To access your insights, we need to verify your card.")?;

    let card_number = terminal.ask("Card number: ").await?;
    flow.set_card_number(&card_number);

    if !flow.can_submit() {
        return terminal.say(&format!(
            "Card number needs at least {CARD_MIN_DIGITS} digits."
        ));
    }

    terminal.say("Processing...")?;
    flow.submit_card().await?;

    report(flow, terminal)
}

fn report<P, T, R, W>(flow: &LoginFlow<P, T>, terminal: &mut Terminal<R, W>) -> Result<()>
where
    P: IdentityProvider,
    T: Tokenizer,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    match flow.error() {
        Some(message) => terminal.say(&format!("Error: {message}")),
        None => Ok(()),
    }
}
