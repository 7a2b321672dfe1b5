//! Client configuration for API and frontend endpoints plus the timing used by
//! the session flows. Defaults match a local development setup; the CLI layers
//! command-line and environment overrides on top. Configuration values are
//! public; do not store secrets here.

use crate::client::build_url_with_base;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";

/// Frontend route the user lands on when a session is missing or rejected.
pub const LOGIN_PATH: &str = "/login";
/// Frontend route the user lands on after a successful link verification.
pub const LANDING_PATH: &str = "/dashboard";

/// Default timeout for ordinary API calls.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Bound on the one-time token exchange.
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 15_000;
/// Delay before the access gate redirects an unauthenticated user.
pub const DEFAULT_GATE_REDIRECT_DELAY_MS: u64 = 3_000;
/// Delay before navigating to the landing page after verification succeeds.
pub const DEFAULT_SUCCESS_REDIRECT_DELAY_MS: u64 = 2_000;
/// Seconds shown in the login countdown after a verification failure.
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 3;

/// Client configuration shared by every flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub frontend_base_url: String,
    pub request_timeout: Duration,
    pub verify_timeout: Duration,
    pub gate_redirect_delay: Duration,
    pub success_redirect_delay: Duration,
    pub countdown_seconds: u32,
    pub countdown_tick: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    /// Default config: local API and frontend, 10s requests, 15s token exchange,
    /// 3s gate redirect, 2s success redirect and a 3 second login countdown.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            verify_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
            gate_redirect_delay: Duration::from_millis(DEFAULT_GATE_REDIRECT_DELAY_MS),
            success_redirect_delay: Duration::from_millis(DEFAULT_SUCCESS_REDIRECT_DELAY_MS),
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            countdown_tick: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        if let Some(value) = normalize_value(url) {
            self.api_base_url = value;
        }
        self
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, url: &str) -> Self {
        if let Some(value) = normalize_value(url) {
            self.frontend_base_url = value;
        }
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_gate_redirect_delay(mut self, delay: Duration) -> Self {
        self.gate_redirect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_success_redirect_delay(mut self, delay: Duration) -> Self {
        self.success_redirect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_countdown(mut self, seconds: u32, tick: Duration) -> Self {
        self.countdown_seconds = seconds;
        self.countdown_tick = tick;
        self
    }

    /// Applies overrides, ignoring values that are empty after trimming.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(value) = overrides.api_base_url.as_deref().and_then(normalize_value) {
            self.api_base_url = value;
        }
        if let Some(value) = overrides
            .frontend_base_url
            .as_deref()
            .and_then(normalize_value)
        {
            self.frontend_base_url = value;
        }
        self
    }

    /// Absolute frontend URL for the provided route.
    #[must_use]
    pub fn frontend_url(&self, path: &str) -> String {
        build_url_with_base(&self.frontend_base_url, path)
    }

    #[must_use]
    pub fn login_url(&self) -> String {
        self.frontend_url(LOGIN_PATH)
    }

    #[must_use]
    pub fn landing_url(&self) -> String {
        self.frontend_url(LANDING_PATH)
    }
}

/// Optional endpoint overrides collected from the command line or environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub frontend_base_url: Option<String>,
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
