//! # Instipass (Institution Client)
//!
//! `instipass` is the client side of the Instipass magic-link login flow. An
//! institution requests a login link by email, follows it, and the client
//! exchanges the one-time token for a bearer credential that unlocks the
//! institution pages.
//!
//! ## Session Flows
//!
//! ### Link Verification
//!
//! 1. **Extract:** The one-time token is read from the `token` query parameter of the link.
//! 2. **Exchange:** The client POSTs it to `/institution/api/auth/verify/session/` under a bounded timeout.
//! 3. **Persist:** On a 2xx the returned access credential is written to client storage
//!    before the client navigates to the dashboard.
//!
//! ### Access Gating
//!
//! Protected content is wrapped in an [`session::gate::AccessGate`]. The gate reads
//! the stored credential and validates it with `Authorization: Bearer` against
//! `/institution/api/institution/`. Invalid credentials are cleared before the
//! delayed redirect to the login page is scheduled.
//!
//! Every flow resolves to a terminal state. Nothing is retried automatically; the
//! user either waits for the scheduled redirect or acts manually.

pub mod cli;
pub mod client;
pub mod config;
pub mod forms;
pub mod session;
pub mod storage;
pub mod theme;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
