//! HTTP client for the Instipass API with consistent timeouts and error handling.
//! Session flows and forms use it so request setup and the timeout policy live in
//! one place. The client never stores credentials; callers pass the bearer value
//! per request and must avoid logging it.

pub mod errors;

pub use errors::AppError;

use crate::{APP_USER_AGENT, config::AppConfig};
use reqwest::{Client, RequestBuilder, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

/// Status and body of a completed request. Non-2xx responses are returned as
/// values so callers can classify them by status and payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns `AppError::Parse` when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_str(&self.body)
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    }

    /// Body as a JSON value, `None` when it is not JSON.
    #[must_use]
    pub fn json_value(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Top-level string field of a JSON body, e.g. `detail` or `code`.
    #[must_use]
    pub fn string_field(&self, name: &str) -> Option<String> {
        self.json_value()?
            .get(name)?
            .as_str()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    }

    /// Server-provided human readable detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        self.string_field("detail")
            .or_else(|| self.string_field("message"))
            .or_else(|| self.string_field("error"))
    }

    /// Converts the response into an `AppError::Http` with a sanitized body.
    #[must_use]
    pub fn into_http_error(self) -> AppError {
        AppError::Http {
            status: self.status,
            message: sanitize_body(&self.body),
        }
    }
}

/// Thin wrapper around `reqwest::Client` bound to one API base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// # Errors
    /// Returns `AppError::Config` if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            timeout: request_timeout,
        })
    }

    /// # Errors
    /// Returns `AppError::Config` if the underlying HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    /// Same client with a different request bound; the connection pool is shared.
    #[must_use]
    pub fn with_timeout(&self, request_timeout: Duration) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            timeout: request_timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    /// GET with an `Authorization: Bearer` header.
    ///
    /// # Errors
    /// Returns network or timeout errors; HTTP error statuses are returned as responses.
    #[instrument(skip(self, bearer))]
    pub async fn get_with_bearer(&self, path: &str, bearer: &str) -> Result<ApiResponse, AppError> {
        let request = self.http.get(self.url(path)).bearer_auth(bearer);
        self.send(request).await
    }

    /// POST with an empty body and the given query parameters.
    ///
    /// # Errors
    /// Returns network or timeout errors; HTTP error statuses are returned as responses.
    #[instrument(skip(self, query))]
    pub async fn post_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse, AppError> {
        let request = self.http.post(self.url(path)).query(query);
        self.send(request).await
    }

    /// POST a JSON body without authentication.
    ///
    /// # Errors
    /// Returns network or timeout errors; HTTP error statuses are returned as responses.
    #[instrument(skip(self, body))]
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, AppError> {
        let payload = encode(body)?;
        let request = self
            .http
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(payload);
        self.send(request).await
    }

    /// PATCH a JSON body with an `Authorization: Bearer` header.
    ///
    /// # Errors
    /// Returns network or timeout errors; HTTP error statuses are returned as responses.
    #[instrument(skip(self, bearer, body))]
    pub async fn patch_json_with_bearer<B: Serialize + ?Sized>(
        &self,
        path: &str,
        bearer: &str,
        body: &B,
    ) -> Result<ApiResponse, AppError> {
        let payload = encode(body)?;
        let request = self
            .http
            .patch(self.url(path))
            .bearer_auth(bearer)
            .header("Content-Type", "application/json")
            .body(payload);
        self.send(request).await
    }

    /// PATCH a multipart form with an `Authorization: Bearer` header.
    ///
    /// # Errors
    /// Returns network or timeout errors; HTTP error statuses are returned as responses.
    #[instrument(skip(self, bearer, form))]
    pub async fn patch_multipart_with_bearer(
        &self,
        path: &str,
        bearer: &str,
        form: Form,
    ) -> Result<ApiResponse, AppError> {
        let request = self
            .http
            .patch(self.url(path))
            .bearer_auth(bearer)
            .multipart(form);
        self.send(request).await
    }

    /// Sends a request and reads the body under the configured bound. When the
    /// bound elapses the request future is dropped, which aborts it.
    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, AppError> {
        let exchange = async {
            let response = request.send().await.map_err(map_request_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(map_request_error)?;
            Ok::<_, AppError>(ApiResponse { status, body })
        };

        match timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => {
                debug!(status = response.status, "response received");
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!("request failed: {err}");
                Err(err)
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis(), "request timed out");
                Err(AppError::Timeout(
                    "Request timed out. Please try again.".to_string(),
                ))
            }
        }
    }
}

/// Builds a URL from an explicit base URL and the provided path.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String, AppError> {
    serde_json::to_string(body)
        .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))
}

/// Maps reqwest errors into `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
