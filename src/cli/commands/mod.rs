use crate::config;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

/// Provider settings as `(argument id, environment variable, help)`.
const PROVIDER_ARGS: [(&str, &str, &str); 10] = [
    (
        "user-pool-id",
        config::USER_POOL_ID,
        "Cognito user pool id, example: us-east-1_AbCdEf123",
    ),
    (
        "client-id",
        config::USER_POOL_CLIENT_ID,
        "Cognito user pool app client id",
    ),
    (
        "domain",
        config::DOMAIN,
        "Hosted UI domain, example: auth.example.com",
    ),
    ("redirect-uri", config::REDIRECT_URI, "OAuth redirect URI"),
    (
        "response-type",
        config::RESPONSE_TYPE,
        "OAuth response type: code or token",
    ),
    ("scope", config::SCOPE, "Space-delimited OAuth scopes"),
    (
        "endpoint",
        config::ENDPOINT,
        "Override the cognito-idp endpoint, example: http://localhost:9229/",
    ),
    ("vgs-vault-id", config::VGS_VAULT_ID, "VGS vault id"),
    (
        "vgs-environment",
        config::VGS_ENVIRONMENT,
        "VGS environment, example: sandbox",
    ),
    ("api-base-url", config::API_BASE_URL, "Backend API base URL"),
];

/// Argument id backing an environment variable, if any.
#[must_use]
pub fn arg_for_env(var: &str) -> Option<&'static str> {
    PROVIDER_ARGS
        .iter()
        .find(|(_, env, _)| *env == var)
        .map(|(id, _, _)| *id)
}

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("otpgate")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand(
            Command::new("login")
                .about("Sign in with an emailed code and capture a card (default)")
                .arg(
                    Arg::new("sign-out")
                        .long("sign-out")
                        .help("Sign out globally once the login completes")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("hosted-url")
                .about("Print the hosted UI authorize URL")
                .arg(
                    Arg::new("state")
                        .long("state")
                        .help("Opaque OAuth state echoed back to the redirect URI"),
                ),
        );

    let command = PROVIDER_ARGS
        .iter()
        .fold(command, |command, &(id, env, help)| {
            command.arg(Arg::new(id).long(id).help(help).env(env).global(true))
        });

    command.arg(
        Arg::new("verbosity")
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("OTPGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
