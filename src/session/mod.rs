//! Session feature covering the magic-link exchange and access gating. Both
//! state machines are thin orchestration over the API: the server issues and
//! enforces credentials, the client only stores the bearer value and decides
//! where to send the user next. Nothing here may log token material.
//!
//! Flow Overview: `LinkVerifier` turns a one-time link token into a stored
//! `Credential` and navigates to the landing page. `AccessGate` validates the
//! stored credential before protected content is shown, clearing it and
//! redirecting to login when the server rejects it.

pub mod errors;
pub mod gate;
pub mod schedule;
pub mod verify;

pub use errors::AuthError;
pub use gate::{AccessGate, GateMount, GateOptions, GateView};
pub use schedule::{Navigator, RecordingNavigator, ScheduledTask};
pub use verify::{LinkVerifier, VerifyMount, VerifyOptions};

use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Opaque bearer string issued by the verification endpoint.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wraps a bearer value; blank values are not credentials.
    #[must_use]
    pub fn new(value: String) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(SecretString::from(trimmed.to_string())))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// One-time token taken from a login link. It is moved into exactly one
/// exchange call.
pub struct VerificationRequest {
    token: SecretString,
}

impl VerificationRequest {
    /// Query parameter that carries the one-time token.
    pub const TOKEN_PARAM: &'static str = "token";

    #[must_use]
    pub fn new(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                token: SecretString::from(trimmed.to_string()),
            })
        }
    }

    /// Extracts the token from a full link, e.g. `https://app/verify?token=abc`.
    #[must_use]
    pub fn from_link(link: &Url) -> Option<Self> {
        link.query_pairs()
            .find(|(key, _)| key == Self::TOKEN_PARAM)
            .and_then(|(_, value)| Self::new(&value))
    }

    /// Extracts the token from a raw query string, with or without the leading `?`.
    #[must_use]
    pub fn from_query(query: &str) -> Option<Self> {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == Self::TOKEN_PARAM)
            .and_then(|(_, value)| Self::new(&value))
    }

    pub(crate) fn into_token(self) -> SecretString {
        self.token
    }
}

impl std::fmt::Debug for VerificationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationRequest")
            .field("token", &"***")
            .finish()
    }
}

/// Progress of a link verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Pending,
    /// Carries the credential when the server returned one.
    Success(Option<Credential>),
    Failure(AuthError),
}

impl VerificationOutcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Progress of an access check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessCheckOutcome {
    Validating,
    Valid,
    Invalid(String),
    Error(String),
}

impl AccessCheckOutcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Validating)
    }
}
