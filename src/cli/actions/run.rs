use crate::cli::actions::{hosted_url, login, Action};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::HostedUrl(args) => hosted_url::execute(&args),
    }
}
