use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub state: Option<String>,
}

/// Prints the hosted UI authorize URL.
/// # Errors
/// Returns an error if the configured domain is not a valid host.
pub fn execute(args: &Args) -> Result<()> {
    let url = args.globals.cognito.authorize_url(args.state.as_deref())?;

    debug!("authorize url for client {}", args.globals.cognito.user_pool_client_id);

    println!("{url}");

    Ok(())
}
