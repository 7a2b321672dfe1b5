//! Access gate for protected content. A mount reads the stored credential,
//! validates it once against the API and settles in a terminal state:
//!
//! - `Valid`: content is rendered, nothing is scheduled.
//! - `Invalid`: the credential is cleared, then a delayed redirect to login runs.
//! - `Error`: transport or parse failure; no redirect, the user can go to login
//!   manually.
//!
//! This is a UX guard only; the API enforces access on every request.

use super::{
    AccessCheckOutcome, Credential,
    schedule::{Navigator, ScheduledTask},
};
use crate::{client::ApiClient, config::AppConfig, storage::CredentialStore};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::sleep};
use tracing::{error, info, instrument, warn};

/// Endpoint that accepts a valid bearer credential.
pub const VALIDATION_PATH: &str = "/institution/api/institution/";

pub const NO_TOKEN_FOUND: &str = "no token found";
pub const INVALID_TOKEN_DEFAULT: &str = "Invalid or expired access token.";
pub const VALIDATION_FAILED_MESSAGE: &str =
    "Unable to validate your access. Please try again or log in.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateOptions {
    pub validation_path: String,
    pub redirect_to: String,
    pub redirect_delay: Duration,
}

impl GateOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            validation_path: VALIDATION_PATH.to_string(),
            redirect_to: config.login_url(),
            redirect_delay: config.gate_redirect_delay,
        }
    }

    #[must_use]
    pub fn with_validation_path(mut self, path: &str) -> Self {
        self.validation_path = path.to_string();
        self
    }

    #[must_use]
    pub fn with_redirect_to(mut self, url: &str) -> Self {
        self.redirect_to = url.to_string();
        self
    }

    #[must_use]
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }
}

/// What a mounted gate shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateView<T> {
    Validating,
    Content(T),
    AccessDenied { reason: String, redirect_to: String },
    Error { message: String, login_url: String },
}

#[derive(Clone)]
pub struct AccessGate {
    api: ApiClient,
    store: CredentialStore,
    navigator: Arc<dyn Navigator>,
    options: GateOptions,
}

impl AccessGate {
    #[must_use]
    pub fn new(
        api: ApiClient,
        store: CredentialStore,
        navigator: Arc<dyn Navigator>,
        options: GateOptions,
    ) -> Self {
        Self {
            api,
            store,
            navigator,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    /// Runs one access check without scheduling anything. A rejected credential
    /// is cleared before this returns.
    pub async fn check(&self) -> AccessCheckOutcome {
        match self.stored_credential() {
            Ok(Some(credential)) => self.validate(&credential).await,
            Ok(None) => AccessCheckOutcome::Invalid(NO_TOKEN_FOUND.to_string()),
            Err(outcome) => outcome,
        }
    }

    /// Mounts the gate: the outcome is published through the returned handle and
    /// the redirect, if any, is owned by it. Dropping the handle unmounts.
    #[must_use]
    pub fn mount(&self) -> GateMount {
        let initial = match self.stored_credential() {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(AccessCheckOutcome::Invalid(NO_TOKEN_FOUND.to_string())),
            Err(outcome) => Err(outcome),
        };

        let (state, receiver) = watch::channel(AccessCheckOutcome::Validating);
        let gate = self.clone();

        let task = match initial {
            Ok(credential) => ScheduledTask::spawn(async move {
                let outcome = gate.validate(&credential).await;
                state.send_replace(outcome.clone());
                if let AccessCheckOutcome::Invalid(_) = outcome {
                    gate.redirect_after_delay().await;
                }
            }),
            Err(outcome) => {
                state.send_replace(outcome.clone());
                if let AccessCheckOutcome::Invalid(_) = outcome {
                    ScheduledTask::spawn(async move {
                        // Keep the sender alive until the redirect so late
                        // subscribers still observe a live channel.
                        let _state = state;
                        gate.redirect_after_delay().await;
                    })
                } else {
                    ScheduledTask::finished_task()
                }
            }
        };

        GateMount {
            state: receiver,
            task,
            navigator: Arc::clone(&self.navigator),
            login_url: self.options.redirect_to.clone(),
        }
    }

    fn stored_credential(&self) -> Result<Option<Credential>, AccessCheckOutcome> {
        self.store.load().map_err(|err| {
            error!("failed to read stored credential: {err}");
            AccessCheckOutcome::Error(VALIDATION_FAILED_MESSAGE.to_string())
        })
    }

    #[instrument(skip(self, credential), fields(path = %self.options.validation_path))]
    async fn validate(&self, credential: &Credential) -> AccessCheckOutcome {
        let response = match self
            .api
            .get_with_bearer(&self.options.validation_path, credential.expose())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("access validation failed: {err}");
                return AccessCheckOutcome::Error(VALIDATION_FAILED_MESSAGE.to_string());
            }
        };

        if response.is_success() {
            if !response.body().trim().is_empty() && response.json_value().is_none() {
                warn!("access validation returned an undecodable body");
                return AccessCheckOutcome::Error(VALIDATION_FAILED_MESSAGE.to_string());
            }
            info!("access credential accepted");
            return AccessCheckOutcome::Valid;
        }

        let reason = response
            .detail()
            .unwrap_or_else(|| INVALID_TOKEN_DEFAULT.to_string());
        info!(status = response.status(), "access credential rejected");

        if let Err(err) = self.store.clear() {
            error!("failed to clear rejected credential: {err}");
            return AccessCheckOutcome::Error(VALIDATION_FAILED_MESSAGE.to_string());
        }

        AccessCheckOutcome::Invalid(reason)
    }

    async fn redirect_after_delay(&self) {
        sleep(self.options.redirect_delay).await;
        info!(target_url = %self.options.redirect_to, "redirecting to login");
        self.navigator.navigate(&self.options.redirect_to);
    }
}

/// A mounted gate. Dropping it cancels the in-flight validation and any
/// pending redirect.
pub struct GateMount {
    state: watch::Receiver<AccessCheckOutcome>,
    task: ScheduledTask,
    navigator: Arc<dyn Navigator>,
    login_url: String,
}

impl GateMount {
    #[must_use]
    pub fn outcome(&self) -> AccessCheckOutcome {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AccessCheckOutcome> {
        self.state.clone()
    }

    /// Waits until the gate leaves `Validating`.
    pub async fn settled(&mut self) -> AccessCheckOutcome {
        let settled = self
            .state
            .wait_for(AccessCheckOutcome::is_terminal)
            .await
            .map(|outcome| outcome.clone());
        settled.unwrap_or_else(|_| self.state.borrow().clone())
    }

    /// Waits for the scheduled redirect, if any, to run.
    pub async fn finished(&mut self) {
        self.task.finished().await;
    }

    /// Whether a redirect is still scheduled.
    #[must_use]
    pub fn redirect_pending(&self) -> bool {
        matches!(self.outcome(), AccessCheckOutcome::Invalid(_)) && !self.task.is_finished()
    }

    /// Renders the current state; `children` is only called when access is valid.
    pub fn render<T>(&self, children: impl FnOnce() -> T) -> GateView<T> {
        match self.outcome() {
            AccessCheckOutcome::Validating => GateView::Validating,
            AccessCheckOutcome::Valid => GateView::Content(children()),
            AccessCheckOutcome::Invalid(reason) => GateView::AccessDenied {
                reason,
                redirect_to: self.login_url.clone(),
            },
            AccessCheckOutcome::Error(message) => GateView::Error {
                message,
                login_url: self.login_url.clone(),
            },
        }
    }

    /// Manual "Go to Login" action.
    pub fn go_to_login(&self) {
        self.navigator.navigate(&self.login_url);
    }
}
