//! Bearer token types.
//!
//! This module provides:
//! - [`TokenPair`] - The access token and optional refresh token held by an authorizer
//! - [`AuthorizationHeader`] - The `Authorization: Bearer ...` header derived from a token
//! - [`TokenState`] - Lifecycle state of an authorizer
//! - [`RefreshTokenPolicy`] - What happens to the refresh token after a refresh
//!
//! Wire types for the `/token/` and `/token/refresh/` endpoints live here too.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::secret::Secret;

/// Access token plus the refresh token that came with it (if any).
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// The current access token. Never empty once stored.
    pub access_token: Secret,

    /// The refresh token, absent after a refresh under [`RefreshTokenPolicy::Discard`].
    pub refresh_token: Option<Secret>,

    /// When the access token was obtained or last refreshed.
    pub obtained_at: DateTime<Utc>,
}

impl TokenPair {
    /// Create a token pair with just an access token.
    pub fn new(access_token: impl Into<Secret>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            obtained_at: Utc::now(),
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<Secret>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// The header that authenticates a request with this pair's access token.
    pub fn header(&self) -> AuthorizationHeader {
        AuthorizationHeader::bearer(&self.access_token)
    }
}

/// `Authorization: Bearer <access_token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    value: Secret,
}

impl AuthorizationHeader {
    pub const KEY: &'static str = "Authorization";

    /// Create a bearer header for `access_token`.
    pub fn bearer(access_token: &Secret) -> Self {
        Self {
            value: Secret::new(format!("Bearer {}", access_token.expose())),
        }
    }

    /// The header name, always `Authorization`.
    pub fn key(&self) -> &'static str {
        Self::KEY
    }

    /// The full header value, e.g. `Bearer abc123`.
    pub fn value(&self) -> &str {
        self.value.expose()
    }

    /// Convert into a header pair for reqwest, marked sensitive.
    pub fn to_header(&self) -> Result<(HeaderName, HeaderValue), InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(self.value())?;
        value.set_sensitive(true);
        Ok((AUTHORIZATION, value))
    }
}

impl fmt::Debug for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationHeader")
            .field("key", &Self::KEY)
            .field("value", &"Bearer [REDACTED]")
            .finish()
    }
}

/// Lifecycle state of an authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token has been obtained yet.
    NoToken,
    /// A token is held and the last probe accepted it.
    Valid,
    /// The last probe returned 401 and the token has not been replaced yet.
    Expired,
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoToken => write!(f, "no-token"),
            Self::Valid => write!(f, "valid"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// What to do with the refresh token after it has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenPolicy {
    /// Drop the refresh token after one refresh. The next expiry then
    /// triggers a full re-acquisition.
    #[default]
    Discard,
    /// Keep the refresh token, replacing it only if the refresh response
    /// carries a new one.
    Retain,
}

impl std::str::FromStr for RefreshTokenPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "retain" => Ok(Self::Retain),
            _ => Err(format!("unknown refresh token policy: {} (discard, retain)", s)),
        }
    }
}

/// Body of `POST /token/`.
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response of `POST /token/`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Body of `POST /token/refresh/`.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response of `POST /token/refresh/`. Rotating servers may include `refresh`.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}
