use crate::{
    cli::{actions::TerminalNavigator, globals::GlobalArgs},
    session::{AccessGate, AuthError, Credential, GateOptions, GateView},
};
use anyhow::{Result, anyhow, bail};
use std::sync::Arc;

/// Runs the access gate and returns the stored credential once it is accepted.
/// A rejected session waits for the login redirect before failing.
///
/// # Errors
/// Returns an error if access is denied or cannot be validated.
pub async fn require_session(globals: &GlobalArgs) -> Result<Credential> {
    let store = globals.credential_store();
    let gate = AccessGate::new(
        globals.api_client()?,
        store.clone(),
        Arc::new(TerminalNavigator),
        GateOptions::from_config(&globals.config),
    );

    let mut mount = gate.mount();
    mount.settled().await;

    match mount.render(|| store.load()) {
        GateView::Content(loaded) => loaded?.ok_or_else(|| anyhow!(AuthError::MissingCredential)),
        GateView::AccessDenied {
            reason,
            redirect_to,
        } => {
            eprintln!("Access denied: {reason}");
            eprintln!("You will be redirected to {redirect_to} shortly.");
            mount.finished().await;
            bail!("access denied")
        }
        GateView::Error { message, login_url } => {
            eprintln!("{message}");
            eprintln!("Go to login: {login_url}");
            bail!("access validation failed")
        }
        GateView::Validating => bail!("access validation was interrupted"),
    }
}

/// # Errors
/// Returns an error if the stored session is missing or rejected.
pub async fn execute(globals: &GlobalArgs) -> Result<()> {
    require_session(globals).await?;
    println!("Session is valid.");
    Ok(())
}
