//! Light/dark preference shared by every view, persisted under the `theme`
//! storage key.

use crate::storage::{ClientStorage, StorageError, THEME_KEY};
use std::{fmt, sync::Arc, sync::OnceLock};
use tokio::sync::watch;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ThemeStore {
    storage: Arc<dyn ClientStorage>,
    current: watch::Sender<Theme>,
}

impl ThemeStore {
    /// Loads the saved preference. Unknown or missing values fall back to light.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    pub fn load(storage: Arc<dyn ClientStorage>) -> Result<Self, StorageError> {
        let saved = storage.get_item(THEME_KEY)?;
        let theme = saved.as_deref().and_then(Theme::parse).unwrap_or_default();
        debug!(theme = %theme, "theme loaded");
        Ok(Self {
            storage,
            current: watch::Sender::new(theme),
        })
    }

    #[must_use]
    pub fn current(&self) -> Theme {
        *self.current.borrow()
    }

    /// Persists `theme`, then notifies subscribers if it changed.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written; the current
    /// theme is left unchanged in that case.
    pub fn set(&self, theme: Theme) -> Result<(), StorageError> {
        self.storage.set_item(THEME_KEY, theme.as_str())?;
        self.current.send_if_modified(|current| {
            let changed = *current != theme;
            *current = theme;
            changed
        });
        Ok(())
    }

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    pub fn toggle(&self) -> Result<Theme, StorageError> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.current.subscribe()
    }
}

impl fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeStore")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

static THEME: OnceLock<ThemeStore> = OnceLock::new();

/// Installs the process-wide theme store. Later calls keep the first store.
///
/// # Errors
/// Returns an error if the saved preference cannot be read.
pub fn init_global(storage: Arc<dyn ClientStorage>) -> Result<&'static ThemeStore, StorageError> {
    if let Some(store) = THEME.get() {
        return Ok(store);
    }
    let store = ThemeStore::load(storage)?;
    Ok(THEME.get_or_init(|| store))
}

#[must_use]
pub fn global() -> Option<&'static ThemeStore> {
    THEME.get()
}
