use crate::{
    cli::{
        actions::{hosted_url, login, Action},
        commands,
        globals::GlobalArgs,
    },
    config::{ApiConfig, CognitoConfig, VaultConfig},
};
use anyhow::Result;

/// # Errors
/// Returns an error if a required provider setting is missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    // flags and their environment variables both land in `matches`
    let lookup = |var: &str| {
        commands::arg_for_env(var).and_then(|id| matches.get_one::<String>(id).cloned())
    };

    let cognito = CognitoConfig::from_lookup(lookup)?;

    let globals = GlobalArgs::new(cognito)
        .with_vault(VaultConfig::from_lookup(lookup).ok())
        .with_api(ApiConfig::from_lookup(lookup).ok());

    match matches.subcommand() {
        Some(("hosted-url", sub_m)) => Ok(Action::HostedUrl(hosted_url::Args {
            globals,
            state: sub_m.get_one::<String>("state").cloned(),
        })),
        Some(("login", sub_m)) => Ok(Action::Login(login::Args {
            globals,
            sign_out: sub_m.get_flag("sign-out"),
        })),
        _ => Ok(Action::Login(login::Args {
            globals,
            sign_out: false,
        })),
    }
}
