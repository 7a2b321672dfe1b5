//! Newsletter signup form.

use super::{classify_email_form_failure, field_errors, require_email};
use crate::{client::ApiClient, session::AuthError};
use serde::Serialize;
use tracing::{info, instrument};

pub const NEWSLETTER_PATH: &str = "/institution/api/newsletter/";
pub const SUBSCRIBED_MESSAGE: &str = "Thanks for subscribing to the Instipass newsletter!";

#[derive(Serialize)]
struct NewsletterRequest<'a> {
    email: &'a str,
}

/// Subscribes `email` to the newsletter.
///
/// A 400 carrying an `email` field error means the address is already on the
/// list. Any other 400 is reported as an invalid address. Fixed messages are
/// shown instead of the server payload.
///
/// # Errors
/// Returns a validation error for a malformed address, `AlreadySubscribed`,
/// or the categorized server or transport failure.
#[instrument(skip(api, email))]
pub async fn subscribe(api: &ApiClient, email: &str) -> Result<&'static str, AuthError> {
    let email = require_email(email)?;

    let response = api
        .post_json(NEWSLETTER_PATH, &NewsletterRequest { email })
        .await
        .map_err(|err| AuthError::from_transport(&err))?;

    if response.is_success() {
        info!("newsletter subscription created");
        return Ok(SUBSCRIBED_MESSAGE);
    }

    if response.status() == 400
        && field_errors(&response)
            .iter()
            .any(|(field, _)| field == "email")
    {
        return Err(AuthError::AlreadySubscribed);
    }

    Err(classify_email_form_failure(&response))
}
