use crate::{
    client::ApiClient,
    config::AppConfig,
    storage::{ClientStorage, CredentialStore, FileStorage},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};

/// Settings shared by every subcommand.
#[derive(Clone)]
pub struct GlobalArgs {
    pub config: AppConfig,
    pub store_path: PathBuf,
    storage: Arc<FileStorage>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(config: AppConfig, store_path: PathBuf) -> Self {
        let storage = Arc::new(FileStorage::new(store_path.clone()));
        Self {
            config,
            store_path,
            storage,
        }
    }

    #[must_use]
    pub fn storage(&self) -> Arc<dyn ClientStorage> {
        self.storage.clone()
    }

    #[must_use]
    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(self.storage())
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::from_config(&self.config).context("failed to build API client")
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("api_base_url", &self.config.api_base_url)
            .field("frontend_base_url", &self.config.frontend_base_url)
            .field("store_path", &self.store_path)
            .finish_non_exhaustive()
    }
}
