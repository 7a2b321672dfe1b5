//! Supporting forms layered on the session core: login-link requests, newsletter
//! signup and institution settings. Each performs one validate-then-submit
//! cycle and reports a fixed, categorized message. Nothing is retried or queued.

pub mod login_link;
pub mod newsletter;
pub mod settings;

use crate::{client::ApiResponse, session::AuthError};
use regex::Regex;
use serde_json::Value;

pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const FORM_INVALID_MESSAGE: &str = "Please check the form and try again.";

/// Fields in an error body that describe the error rather than a form field.
const META_FIELDS: [&str; 3] = ["detail", "code", "message"];

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Client-side email check shared by the public forms.
///
/// # Errors
/// Returns a validation error for the `email` field.
pub fn require_email(email: &str) -> Result<&str, AuthError> {
    let email = email.trim();
    if valid_email(email) {
        Ok(email)
    } else {
        Err(AuthError::validation("email", INVALID_EMAIL_MESSAGE))
    }
}

/// Field errors from a `{"field": ["message", ...]}` style body, sorted by field
/// name.
#[must_use]
pub fn field_errors(response: &ApiResponse) -> Vec<(String, String)> {
    let Some(Value::Object(fields)) = response.json_value() else {
        return Vec::new();
    };

    fields
        .into_iter()
        .filter(|(field, _)| !META_FIELDS.contains(&field.as_str()))
        .filter_map(|(field, value)| {
            let message = match value {
                Value::String(message) => Some(message),
                Value::Array(messages) => messages
                    .into_iter()
                    .find_map(|message| message.as_str().map(ToString::to_string)),
                _ => None,
            }?;
            Some((field, message))
        })
        .collect()
}

/// Classifies a non-2xx form response by status, then by field errors. A
/// rejected body without field errors gets the fixed form message.
#[must_use]
pub fn classify_form_failure(response: &ApiResponse) -> AuthError {
    match response.status() {
        400 | 422 => field_errors(response).into_iter().next().map_or_else(
            || AuthError::validation("non_field_errors", FORM_INVALID_MESSAGE),
            |(field, message)| AuthError::ValidationError { field, message },
        ),
        401 => AuthError::InvalidCredential,
        403 => AuthError::Forbidden,
        404 => AuthError::NotFound,
        429 => AuthError::RateLimited,
        _ => AuthError::ServerError,
    }
}

/// Classifies a failure from the single-field email forms. Any rejection of the
/// submitted body is reported as an invalid address.
#[must_use]
pub fn classify_email_form_failure(response: &ApiResponse) -> AuthError {
    match response.status() {
        400 | 422 => AuthError::validation("email", INVALID_EMAIL_MESSAGE),
        _ => classify_form_failure(response),
    }
}
