//! Client-perceived error taxonomy. Every variant has a stable snake_case code
//! and a fixed user-facing message; raw server payloads are never shown.
//!
//! Classification order: HTTP status first, then a structured token `code` field
//! in the response body, then (for token exchange 404s only) a substring match on
//! the server `detail` text. The substring rules are a fallback for servers that
//! do not send a code yet.

use crate::client::{ApiResponse, AppError};
use thiserror::Error;

pub const MISSING_TOKEN_MESSAGE: &str = "Missing login token. Please use the link from your email.";
pub const MISSING_CREDENTIAL_MESSAGE: &str = "No access token found. Please log in.";
pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "Your session is invalid or has expired. Please log in again.";
pub const INVALID_TOKEN_MESSAGE: &str = "This login link is invalid. Please request a new one.";
pub const EXPIRED_TOKEN_MESSAGE: &str = "This login link has expired. Please request a new one.";
pub const USED_TOKEN_MESSAGE: &str =
    "This login link has already been used. Please request a new one.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";
pub const TIMEOUT_ERROR_MESSAGE: &str = "The request timed out. Please try again.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please wait a moment and try again.";
pub const FORBIDDEN_MESSAGE: &str = "You are not allowed to perform this action.";
pub const NOT_FOUND_MESSAGE: &str = "No institution account was found for this request.";
pub const ALREADY_SUBSCRIBED_MESSAGE: &str = "This email is already subscribed to our newsletter.";
pub const STORAGE_ERROR_MESSAGE: &str = "Unable to save your session on this device.";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", self.message())]
pub enum AuthError {
    MissingToken,
    MissingCredential,
    InvalidCredential,
    InvalidToken,
    ExpiredToken,
    UsedToken,
    NetworkError,
    TimeoutError,
    ServerError,
    ValidationError { field: String, message: String },
    RateLimited,
    Forbidden,
    NotFound,
    AlreadySubscribed,
    StorageError,
}

impl AuthError {
    #[must_use]
    pub fn validation(field: &str, message: &str) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::InvalidToken => "token_invalid",
            Self::ExpiredToken => "token_expired",
            Self::UsedToken => "token_used",
            Self::NetworkError => "network_error",
            Self::TimeoutError => "timeout_error",
            Self::ServerError => "server_error",
            Self::ValidationError { .. } => "validation_error",
            Self::RateLimited => "rate_limited",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::AlreadySubscribed => "already_subscribed",
            Self::StorageError => "storage_error",
        }
    }

    /// Parses a structured code sent by the server. Validation errors carry a
    /// field and are never produced from a bare code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let parsed = match code.trim() {
            "missing_token" => Self::MissingToken,
            "missing_credential" => Self::MissingCredential,
            "invalid_credential" => Self::InvalidCredential,
            "token_invalid" => Self::InvalidToken,
            "token_expired" => Self::ExpiredToken,
            "token_used" => Self::UsedToken,
            "network_error" => Self::NetworkError,
            "timeout_error" => Self::TimeoutError,
            "server_error" => Self::ServerError,
            "rate_limited" => Self::RateLimited,
            "forbidden" => Self::Forbidden,
            "not_found" => Self::NotFound,
            "already_subscribed" => Self::AlreadySubscribed,
            _ => return None,
        };
        Some(parsed)
    }

    /// True for the kinds a token exchange can report about the token itself.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::MissingToken | Self::InvalidToken | Self::ExpiredToken | Self::UsedToken
        )
    }

    /// Fixed user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::MissingToken => MISSING_TOKEN_MESSAGE,
            Self::MissingCredential => MISSING_CREDENTIAL_MESSAGE,
            Self::InvalidCredential => INVALID_CREDENTIAL_MESSAGE,
            Self::InvalidToken => INVALID_TOKEN_MESSAGE,
            Self::ExpiredToken => EXPIRED_TOKEN_MESSAGE,
            Self::UsedToken => USED_TOKEN_MESSAGE,
            Self::NetworkError => NETWORK_ERROR_MESSAGE,
            Self::TimeoutError => TIMEOUT_ERROR_MESSAGE,
            Self::ServerError => SERVER_ERROR_MESSAGE,
            Self::ValidationError { message, .. } => message.as_str(),
            Self::RateLimited => RATE_LIMITED_MESSAGE,
            Self::Forbidden => FORBIDDEN_MESSAGE,
            Self::NotFound => NOT_FOUND_MESSAGE,
            Self::AlreadySubscribed => ALREADY_SUBSCRIBED_MESSAGE,
            Self::StorageError => STORAGE_ERROR_MESSAGE,
        }
    }

    /// Maps transport failures. Requests that could not be built or sent are
    /// reported as network errors; undecodable bodies as server errors.
    #[must_use]
    pub fn from_transport(err: &AppError) -> Self {
        match err {
            AppError::Timeout(_) => Self::TimeoutError,
            AppError::Network(_) | AppError::Config(_) | AppError::Serialization(_) => {
                Self::NetworkError
            }
            AppError::Parse(_) => Self::ServerError,
            AppError::Storage(_) => Self::StorageError,
            AppError::Http { status, .. } => {
                if *status >= 500 {
                    Self::ServerError
                } else {
                    Self::InvalidToken
                }
            }
        }
    }
}

/// Structured token error code from a response body. Codes naming any other
/// kind are ignored so the status rules still apply.
#[must_use]
pub fn structured_token_code(response: &ApiResponse) -> Option<AuthError> {
    response
        .string_field("code")
        .as_deref()
        .and_then(AuthError::from_code)
        .filter(AuthError::is_token_error)
}

/// Classifies a non-2xx response from the token exchange endpoint.
#[must_use]
pub fn classify_exchange_failure(response: &ApiResponse) -> AuthError {
    let status = response.status();
    if status >= 500 {
        return AuthError::ServerError;
    }
    if let Some(kind) = structured_token_code(response) {
        return kind;
    }
    if status == 404 {
        return response
            .detail()
            .map_or(AuthError::InvalidToken, |detail| classify_detail(&detail));
    }
    AuthError::InvalidToken
}

/// Legacy fallback: recover the token error kind from free-form detail text.
fn classify_detail(detail: &str) -> AuthError {
    let lowered = detail.to_lowercase();
    if lowered.contains("expired") {
        AuthError::ExpiredToken
    } else if lowered.contains("missing token") {
        AuthError::MissingToken
    } else {
        AuthError::InvalidToken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_detail_on_404_maps_to_expired_token() {
        let response = ApiResponse::new(404, r#"{"detail": "Token has expired."}"#);
        let err = classify_exchange_failure(&response);
        assert_eq!(err, AuthError::ExpiredToken);
        assert_eq!(err.to_string(), EXPIRED_TOKEN_MESSAGE);
        assert!(err.message().contains("login link has expired"));
    }

    #[test]
    fn missing_token_detail_on_404() {
        let response = ApiResponse::new(404, r#"{"detail": "Missing token in request"}"#);
        assert_eq!(classify_exchange_failure(&response), AuthError::MissingToken);
    }

    #[test]
    fn unknown_404_detail_is_invalid_token() {
        let response = ApiResponse::new(404, r#"{"detail": "No session for token"}"#);
        assert_eq!(classify_exchange_failure(&response), AuthError::InvalidToken);
        assert_eq!(
            classify_exchange_failure(&ApiResponse::new(404, "")),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn structured_code_wins_over_detail() {
        let response = ApiResponse::new(
            404,
            r#"{"code": "token_used", "detail": "Token has expired."}"#,
        );
        assert_eq!(classify_exchange_failure(&response), AuthError::UsedToken);
    }

    #[test]
    fn unknown_structured_code_falls_back_to_detail() {
        let response = ApiResponse::new(
            404,
            r#"{"code": "something_new", "detail": "expired"}"#,
        );
        assert_eq!(classify_exchange_failure(&response), AuthError::ExpiredToken);
    }

    #[test]
    fn non_token_codes_do_not_override_status_rules() {
        for (status, body) in [
            (404, r#"{"code": "timeout_error"}"#),
            (404, r#"{"code": "already_subscribed"}"#),
            (401, r#"{"code": "network_error"}"#),
            (400, r#"{"code": "rate_limited"}"#),
        ] {
            assert_eq!(
                classify_exchange_failure(&ApiResponse::new(status, body)),
                AuthError::InvalidToken,
                "status {status} body {body}"
            );
        }

        let response = ApiResponse::new(404, r#"{"code": "forbidden", "detail": "expired"}"#);
        assert_eq!(classify_exchange_failure(&response), AuthError::ExpiredToken);
    }

    #[test]
    fn server_errors_take_precedence() {
        let response = ApiResponse::new(502, r#"{"code": "token_expired"}"#);
        assert_eq!(classify_exchange_failure(&response), AuthError::ServerError);
    }

    #[test]
    fn other_client_errors_are_invalid_token() {
        assert_eq!(
            classify_exchange_failure(&ApiResponse::new(400, "bad")),
            AuthError::InvalidToken
        );
        assert_eq!(
            classify_exchange_failure(&ApiResponse::new(401, "{}")),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn codes_round_trip_through_from_code() {
        for kind in [
            AuthError::MissingToken,
            AuthError::InvalidToken,
            AuthError::ExpiredToken,
            AuthError::UsedToken,
            AuthError::RateLimited,
            AuthError::AlreadySubscribed,
        ] {
            assert_eq!(AuthError::from_code(kind.code()), Some(kind));
        }
        assert_eq!(AuthError::from_code("validation_error"), None);
    }

    #[test]
    fn transport_errors_map_to_taxonomy() {
        assert_eq!(
            AuthError::from_transport(&AppError::Timeout("t".to_string())),
            AuthError::TimeoutError
        );
        assert_eq!(
            AuthError::from_transport(&AppError::Network("n".to_string())),
            AuthError::NetworkError
        );
        assert_eq!(
            AuthError::from_transport(&AppError::Parse("p".to_string())),
            AuthError::ServerError
        );
    }

    #[test]
    fn validation_error_displays_its_message() {
        let err = AuthError::validation("email", "Enter a valid email address.");
        assert_eq!(err.to_string(), "Enter a valid email address.");
        assert_eq!(err.code(), "validation_error");
    }
}
