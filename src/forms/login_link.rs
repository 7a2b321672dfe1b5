//! Login-link request form. The server emails a magic link whose token the
//! `LinkVerifier` later exchanges for a session.

use super::{classify_email_form_failure, require_email};
use crate::{client::ApiClient, session::AuthError};
use serde::Serialize;
use tracing::{info, instrument};

pub const REQUEST_LINK_PATH: &str = "/institution/api/auth/request/link";
pub const LINK_SENT_MESSAGE: &str = "Check your inbox for a login link.";

#[derive(Serialize)]
struct LoginLinkRequest<'a> {
    email: &'a str,
}

/// Asks the server to email a login link to `email`.
///
/// # Errors
/// Returns a validation error for a malformed or rejected address, otherwise
/// the categorized server or transport failure.
#[instrument(skip(api, email))]
pub async fn request_login_link(api: &ApiClient, email: &str) -> Result<&'static str, AuthError> {
    let email = require_email(email)?;

    let response = api
        .post_json(REQUEST_LINK_PATH, &LoginLinkRequest { email })
        .await
        .map_err(|err| AuthError::from_transport(&err))?;

    if response.is_success() {
        info!("login link requested");
        Ok(LINK_SENT_MESSAGE)
    } else {
        Err(classify_email_form_failure(&response))
    }
}
