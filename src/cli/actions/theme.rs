use crate::{
    cli::globals::GlobalArgs,
    theme::{self, Theme},
};
use anyhow::{Context, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Show,
    Set(Theme),
    Toggle,
}

impl Mode {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "show" => Some(Self::Show),
            "toggle" => Some(Self::Toggle),
            other => Theme::parse(other).map(Self::Set),
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub mode: Mode,
}

/// # Errors
/// Returns an error if the preference cannot be read or saved.
pub fn execute(args: &Args) -> Result<()> {
    let store = theme::init_global(args.globals.storage()).context("failed to load theme")?;

    let current = match args.mode {
        Mode::Show => store.current(),
        Mode::Set(theme) => {
            store.set(theme).context("failed to save theme")?;
            theme
        }
        Mode::Toggle => store.toggle().context("failed to save theme")?,
    };

    println!("{current}");
    Ok(())
}
