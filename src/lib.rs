//! # otpgate
//!
//! Email one-time-code login against a managed identity provider, followed by
//! a card capture step that exchanges the card number for an opaque data token.
//!
//! The crate is split the same way the login is:
//!
//! - [`provider`]: the identity provider seam and the Cognito user-pool client.
//! - [`auth`]: a small facade turning provider calls into the five operations
//!   the login needs (begin sign-in, confirm challenge, sign out,
//!   is-authenticated, get-access-token).
//! - [`flow`]: the step-by-step login state machine and the tokenization seam.
//! - [`config`]: environment-sourced provider configuration.
//! - [`cli`]: the terminal host that renders each step and drives the flow.

pub mod auth;
pub mod cli;
pub mod config;
pub mod flow;
pub mod provider;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
