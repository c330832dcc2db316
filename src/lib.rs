//! An RFC 8555 (ACME) client library core.
//!
//! The entry point is a [`Session`]: the long-lived handle holding the
//! account key, the cached server directory, and the last replay nonce.
//! Resource objects ([`Account`], [`Order`], [`Authorization`],
//! [`Challenge`], [`Certificate`]) are fetched by URL through the session
//! and advanced with signed POSTs; CA-specific behavior is injected through
//! a [`Provider`] resolved at session construction.
//!
//! The HTTP backend is whatever [`http_client::HttpClient`] implementation
//! the application supplies; the library itself never picks one, performs
//! no waits beyond a single transparent bad-nonce retry, and persists
//! nothing. Applications keep the account key (see
//! [`AccountKey::private_jwk`]) and the account URL across runs.

pub mod api;
pub mod connection;
pub mod crypto;
pub mod eab;
pub mod error;
pub mod json;
pub mod provider;
pub mod session;
pub mod wire;

pub(crate) mod base64url;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

pub use api::account::{Account, Contact, RegisterAccount};
pub use api::authorization::Authorization;
pub use api::certificate::{Certificate, RevocationReason};
pub use api::challenge::{Challenge, ChallengeKind, ChallengeRegistry};
pub use api::order::Order;
pub use connection::{AcmeResponse, Connection};
pub use crypto::account_key::AccountKey;
pub use crypto::{account_key_from_jwk, generate_account_key};
pub use eab::EabCredentials;
pub use error::{AcmeError, AcmeResult};
pub use json::Json;
pub use provider::{Provider, ProviderSet, StandardProvider};
pub use session::Session;
pub use wire::directory::{Resource, ServerMetadata};
pub use wire::problem::Problem;
pub use wire::status::Status;

pub static LETS_ENCRYPT_DIRECTORY_URL: &str = "https://acme-v02.api.letsencrypt.org/directory";

/// A session against the Let's Encrypt production directory, with the
/// standard provider set.
pub fn lets_encrypt_session(
    http: impl Into<Arc<dyn http_client::HttpClient>>,
    key: impl AccountKey + 'static,
) -> AcmeResult<Session> {
    Session::new(http, &ProviderSet::standard(), LETS_ENCRYPT_DIRECTORY_URL, key)
}

pub static LETS_ENCRYPT_STAGING_DIRECTORY_URL: &str =
    "https://acme-staging-v02.api.letsencrypt.org/directory";

pub fn lets_encrypt_staging_session(
    http: impl Into<Arc<dyn http_client::HttpClient>>,
    key: impl AccountKey + 'static,
) -> AcmeResult<Session> {
    Session::new(
        http,
        &ProviderSet::standard(),
        LETS_ENCRYPT_STAGING_DIRECTORY_URL,
        key,
    )
}
