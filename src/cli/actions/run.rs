use crate::cli::actions::{Action, forms, gate, logout, settings, theme, verify};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Verify(args) => verify::execute(args).await,
        Action::Gate(globals) => gate::execute(&globals).await,
        Action::RequestLink(args) => forms::request_link(args).await,
        Action::Subscribe(args) => forms::subscribe(args).await,
        Action::Settings(args) => settings::execute(args).await,
        Action::Theme(args) => theme::execute(&args),
        Action::Logout(globals) => logout::execute(&globals),
    }
}
