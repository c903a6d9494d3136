// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential acquisition: a single process-wide bearer credential, kept
//! fresh by two independent authenticators.
//!
//! - [`api_key::ApiKeyAuthenticator`] exchanges a static key/secret at startup
//!   and re-authenticates shortly before expiry.
//! - [`oauth::OAuthAuthenticator`] completes the authorization code + PKCE
//!   flow driven by the callback server and refreshes with the refresh token.
//!
//! Both write into the same [`store::CredentialStore`]; the last writer wins.

pub mod api_key;
pub mod exchange;
pub mod oauth;
pub mod pkce;
pub mod store;
pub mod timer;

pub use store::{Credential, CredentialEvent, CredentialSource, CredentialStore};

use serde::{Deserialize, Deserializer};

/// Read an `expires_in` given as any JSON number.
///
/// Fractions truncate, negatives read as zero and huge values saturate.
pub(crate) fn lifetime_secs<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    Ok(secs.map(|s| s as u64))
}
