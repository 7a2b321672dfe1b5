use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use tracing::info;

/// Clears the stored credential. Logging out without a session is not an error.
///
/// # Errors
/// Returns an error if the storage file cannot be written.
pub fn execute(globals: &GlobalArgs) -> Result<()> {
    globals
        .credential_store()
        .clear()
        .context("failed to clear stored session")?;
    info!(path = %globals.store_path.display(), "session cleared");
    println!("Logged out.");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, session::Credential, storage::ClientStorage};

    #[test]
    fn logout_clears_credential_and_keeps_theme() {
        let dir = tempfile::tempdir().unwrap();
        let globals = GlobalArgs::new(AppConfig::new(), dir.path().join("storage.json"));
        globals
            .credential_store()
            .save(&Credential::new("abc".to_string()).unwrap())
            .unwrap();
        globals
            .storage()
            .set_item(crate::storage::THEME_KEY, "dark")
            .unwrap();

        execute(&globals).unwrap();
        execute(&globals).unwrap();

        assert!(globals.credential_store().load().unwrap().is_none());
        assert_eq!(
            globals
                .storage()
                .get_item(crate::storage::THEME_KEY)
                .unwrap()
                .as_deref(),
            Some("dark")
        );
    }
}
