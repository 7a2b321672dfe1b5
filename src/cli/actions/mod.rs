pub mod forms;
pub mod gate;
pub mod logout;
pub mod settings;
pub mod theme;
pub mod verify;

// Single dispatch point for `Action`; see `run::execute`.
mod run;

use crate::{cli::globals::GlobalArgs, session::Navigator};
use tracing::info;

#[derive(Debug)]
pub enum Action {
    Verify(verify::Args),
    Gate(GlobalArgs),
    RequestLink(forms::Args),
    Subscribe(forms::Args),
    Settings(settings::Args),
    Theme(theme::Args),
    Logout(GlobalArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// Navigation target for the terminal: the URL is printed for the user to open.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, url: &str) {
        info!(target_url = url, "navigate");
        println!("Redirecting to {url}");
    }
}
