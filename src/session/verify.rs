//! Magic-link verification. The one-time token from the link is exchanged once
//! for an access credential under a bounded timeout. On success the credential
//! is stored before the delayed navigation to the landing page; on any failure
//! a visible countdown runs and then navigates to login. No retries.

use super::{
    AuthError, Credential, VerificationOutcome, VerificationRequest,
    errors::classify_exchange_failure,
    schedule::{Navigator, ScheduledTask, count_down},
};
use crate::{client::ApiClient, config::AppConfig, storage::CredentialStore};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::sleep};
use tracing::{error, info, instrument, warn};
use url::Url;

/// Endpoint that exchanges a one-time token for an access credential.
pub const VERIFY_SESSION_PATH: &str = "/institution/api/auth/verify/session/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyOptions {
    pub verify_path: String,
    pub login_url: String,
    pub landing_url: String,
    pub timeout: Duration,
    pub success_delay: Duration,
    pub countdown_seconds: u32,
    pub countdown_tick: Duration,
}

impl VerifyOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            verify_path: VERIFY_SESSION_PATH.to_string(),
            login_url: config.login_url(),
            landing_url: config.landing_url(),
            timeout: config.verify_timeout,
            success_delay: config.success_redirect_delay,
            countdown_seconds: config.countdown_seconds,
            countdown_tick: config.countdown_tick,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExchangeResponse {
    #[serde(default, alias = "access", alias = "token")]
    access_token: Option<String>,
}

#[derive(Clone)]
pub struct LinkVerifier {
    api: ApiClient,
    store: CredentialStore,
    navigator: Arc<dyn Navigator>,
    options: VerifyOptions,
}

impl LinkVerifier {
    /// The exchange runs under `options.timeout` regardless of the client's
    /// default request bound.
    #[must_use]
    pub fn new(
        api: &ApiClient,
        store: CredentialStore,
        navigator: Arc<dyn Navigator>,
        options: VerifyOptions,
    ) -> Self {
        Self {
            api: api.with_timeout(options.timeout),
            store,
            navigator,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Exchanges the token without scheduling anything. The credential, when
    /// the server returns one, is persisted before this returns `Success`.
    #[instrument(skip(self, request), fields(path = %self.options.verify_path))]
    pub async fn exchange(&self, request: VerificationRequest) -> VerificationOutcome {
        let token = request.into_token();
        let response = match self
            .api
            .post_query(
                &self.options.verify_path,
                &[(VerificationRequest::TOKEN_PARAM, token.expose_secret())],
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("token exchange failed: {err}");
                return VerificationOutcome::Failure(AuthError::from_transport(&err));
            }
        };

        if !response.is_success() {
            let kind = classify_exchange_failure(&response);
            info!(status = response.status(), code = kind.code(), "token exchange rejected");
            return VerificationOutcome::Failure(kind);
        }

        let body: ExchangeResponse = if response.body().trim().is_empty() {
            ExchangeResponse::default()
        } else {
            match response.json() {
                Ok(body) => body,
                Err(err) => {
                    warn!("token exchange returned an undecodable body: {err}");
                    return VerificationOutcome::Failure(AuthError::ServerError);
                }
            }
        };

        let Some(credential) = body.access_token.and_then(Credential::new) else {
            info!("token exchange succeeded without a credential");
            return VerificationOutcome::Success(None);
        };

        if let Err(err) = self.store.save(&credential) {
            error!("failed to persist credential: {err}");
            return VerificationOutcome::Failure(AuthError::StorageError);
        }

        info!("token exchange succeeded");
        VerificationOutcome::Success(Some(credential))
    }

    /// Mounts the verifier for a request taken from the current link. A missing
    /// request fails immediately with `missing_token`.
    #[must_use]
    pub fn mount(&self, request: Option<VerificationRequest>) -> VerifyMount {
        let (state, state_rx) = watch::channel(VerificationOutcome::Pending);
        let (countdown, countdown_rx) = watch::channel(None);
        let verifier = self.clone();

        let task = match request {
            Some(request) => ScheduledTask::spawn(async move {
                let outcome = verifier.exchange(request).await;
                state.send_replace(outcome.clone());
                verifier.conclude(&outcome, &countdown).await;
            }),
            None => {
                let outcome = VerificationOutcome::Failure(AuthError::MissingToken);
                state.send_replace(outcome.clone());
                countdown.send_replace(Some(self.options.countdown_seconds));
                ScheduledTask::spawn(async move {
                    let _state = state;
                    verifier.conclude(&outcome, &countdown).await;
                })
            }
        };

        VerifyMount {
            state: state_rx,
            countdown: countdown_rx,
            task,
        }
    }

    /// Mounts the verifier for a full link URL.
    #[must_use]
    pub fn mount_link(&self, link: &str) -> VerifyMount {
        let request = Url::parse(link.trim())
            .ok()
            .and_then(|url| VerificationRequest::from_link(&url));
        self.mount(request)
    }

    async fn conclude(&self, outcome: &VerificationOutcome, countdown: &watch::Sender<Option<u32>>) {
        match outcome {
            VerificationOutcome::Success(_) => {
                sleep(self.options.success_delay).await;
                info!(target_url = %self.options.landing_url, "navigating to landing page");
                self.navigator.navigate(&self.options.landing_url);
            }
            VerificationOutcome::Failure(_) => {
                count_down(
                    self.options.countdown_seconds,
                    self.options.countdown_tick,
                    countdown,
                )
                .await;
                info!(target_url = %self.options.login_url, "redirecting to login");
                self.navigator.navigate(&self.options.login_url);
            }
            VerificationOutcome::Pending => {}
        }
    }
}

/// A mounted verifier. Dropping it cancels the exchange and any pending
/// navigation.
pub struct VerifyMount {
    state: watch::Receiver<VerificationOutcome>,
    countdown: watch::Receiver<Option<u32>>,
    task: ScheduledTask,
}

impl VerifyMount {
    #[must_use]
    pub fn outcome(&self) -> VerificationOutcome {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VerificationOutcome> {
        self.state.clone()
    }

    /// Seconds left before the login redirect; `None` until a failure starts it.
    #[must_use]
    pub fn countdown(&self) -> watch::Receiver<Option<u32>> {
        self.countdown.clone()
    }

    /// Waits until the verification leaves `Pending`.
    pub async fn settled(&mut self) -> VerificationOutcome {
        let settled = self
            .state
            .wait_for(VerificationOutcome::is_terminal)
            .await
            .map(|outcome| outcome.clone());
        settled.unwrap_or_else(|_| self.state.borrow().clone())
    }

    /// Waits for the final navigation to run.
    pub async fn finished(&mut self) {
        self.task.finished().await;
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
