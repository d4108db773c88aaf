//! Bearer token lifecycle.
//!
//! [`Authorizer`] owns the token pair for one application identity and hands
//! out `Authorization` headers:
//!
//! 1. With no token yet, it acquires one from `POST /token/`.
//! 2. Otherwise it probes a protected endpoint with the held token. On 401 it
//!    refreshes via `POST /token/refresh/` when a refresh token is held, or
//!    acquires a new pair when not.
//! 3. Otherwise the held token is still good.
//!
//! The token endpoint response carries no expiry, hence the probe.
//!
//! The read-check-refresh sequence runs under an async mutex so concurrent
//! callers never refresh twice.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Credentials, DEFAULT_PROBE_PATH};
use crate::error::{ApiError, Result};
use crate::http::{self, ApiBase};
use crate::secret::Secret;
use crate::token::{
    AuthorizationHeader, RefreshRequest, RefreshResponse, RefreshTokenPolicy, TokenPair,
    TokenRequest, TokenResponse, TokenState,
};

const TOKEN_PATH: &str = "token/";
const REFRESH_PATH: &str = "token/refresh/";

/// Source of `Authorization` headers for authenticated endpoints.
///
/// Implemented by [`Authorizer`]; [`StaticAuth`] serves a fixed header.
#[async_trait]
pub trait AuthHeaderProvider: Send + Sync {
    /// Return a header that the API should currently accept.
    async fn get_auth_header(&self) -> Result<AuthorizationHeader>;
}

/// A provider that always returns the same pre-issued token.
#[derive(Debug, Clone)]
pub struct StaticAuth {
    header: AuthorizationHeader,
}

impl StaticAuth {
    /// Create a provider that always sends `access_token`.
    pub fn new(access_token: impl Into<Secret>) -> Self {
        Self {
            header: AuthorizationHeader::bearer(&access_token.into()),
        }
    }
}

#[async_trait]
impl AuthHeaderProvider for StaticAuth {
    async fn get_auth_header(&self) -> Result<AuthorizationHeader> {
        Ok(self.header.clone())
    }
}

#[derive(Debug)]
struct AuthState {
    tokens: Option<TokenPair>,
    state: TokenState,
}

/// Token-endpoint backed [`AuthHeaderProvider`].
pub struct Authorizer {
    http: Client,
    base: ApiBase,
    credentials: Credentials,
    policy: RefreshTokenPolicy,
    probe_path: String,
    inner: Mutex<AuthState>,
}

impl Authorizer {
    /// Create an authorizer with no token held yet.
    pub fn new(http: Client, base: ApiBase, credentials: Credentials) -> Self {
        Self {
            http,
            base,
            credentials,
            policy: RefreshTokenPolicy::default(),
            probe_path: DEFAULT_PROBE_PATH.to_string(),
            inner: Mutex::new(AuthState {
                tokens: None,
                state: TokenState::NoToken,
            }),
        }
    }

    /// Build an authorizer from configuration, sharing `http`.
    pub fn from_config(config: &ClientConfig, http: Client) -> Result<Self> {
        let base = ApiBase::parse(&config.api_uri)?;
        Ok(Self::new(http, base, config.credentials()?)
            .with_refresh_token_policy(config.refresh_token_policy)
            .with_probe_path(config.probe_path()))
    }

    /// Set what happens to the refresh token after a refresh.
    pub fn with_refresh_token_policy(mut self, policy: RefreshTokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the protected endpoint used for validity probes.
    pub fn with_probe_path(mut self, path: impl Into<String>) -> Self {
        self.probe_path = path.into();
        self
    }

    pub fn refresh_token_policy(&self) -> RefreshTokenPolicy {
        self.policy
    }

    pub async fn state(&self) -> TokenState {
        self.inner.lock().await.state
    }

    /// Snapshot of the held token pair.
    pub async fn token_pair(&self) -> Option<TokenPair> {
        self.inner.lock().await.tokens.clone()
    }

    /// Drop held tokens. The next header request acquires a new pair.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        inner.tokens = None;
        inner.state = TokenState::NoToken;
        debug!("dropped held tokens for {}", self.credentials.app_id);
    }

    async fn acquire(&self) -> Result<TokenPair> {
        let url = self.base.join_path(TOKEN_PATH)?;
        let body = serde_json::to_value(TokenRequest {
            username: &self.credentials.app_id,
            password: self.credentials.app_secret.expose(),
        })?;

        let response = http::execute(&self.http, Method::POST, url, None, Some(body))
            .await
            .map_err(auth_failure)?;

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "token request rejected");
            return Err(ApiError::Authentication {
                message: format!("token endpoint returned {}: {}", response.status, response.body),
            });
        }

        let token: TokenResponse = response.json().map_err(auth_failure)?;
        let mut pair = TokenPair::new(non_empty(token.access)?);
        if let Some(refresh) = token.refresh.filter(|r| !r.is_empty()) {
            pair = pair.with_refresh_token(refresh);
        }

        info!("obtained access token for {}", self.credentials.app_id);
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &Secret) -> Result<TokenPair> {
        let url = self.base.join_path(REFRESH_PATH)?;
        let body = serde_json::to_value(RefreshRequest {
            refresh: refresh_token.expose(),
        })?;

        let response = http::execute(&self.http, Method::POST, url, None, Some(body))
            .await
            .map_err(auth_failure)?;

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "token refresh rejected");
            return Err(ApiError::Authentication {
                message: format!(
                    "token refresh endpoint returned {}: {}",
                    response.status, response.body
                ),
            });
        }

        let token: RefreshResponse = response.json().map_err(auth_failure)?;
        let mut pair = TokenPair::new(non_empty(token.access)?);

        match self.policy {
            RefreshTokenPolicy::Discard => {
                debug!("refresh token discarded after use; next expiry re-acquires");
            }
            RefreshTokenPolicy::Retain => {
                let next = token
                    .refresh
                    .filter(|r| !r.is_empty())
                    .map(Secret::new)
                    .unwrap_or_else(|| refresh_token.clone());
                pair.refresh_token = Some(next);
            }
        }

        info!("refreshed access token for {}", self.credentials.app_id);
        Ok(pair)
    }

    /// `true` if the API still accepts `access_token`.
    async fn probe(&self, access_token: &Secret) -> Result<bool> {
        let url = self.base.join_path(&self.probe_path)?;
        let header = AuthorizationHeader::bearer(access_token);
        let response = http::execute(&self.http, Method::GET, url, Some(&header), None).await?;
        Ok(response.status != StatusCode::UNAUTHORIZED)
    }
}

#[async_trait]
impl AuthHeaderProvider for Authorizer {
    async fn get_auth_header(&self) -> Result<AuthorizationHeader> {
        let mut inner = self.inner.lock().await;

        let held = inner
            .tokens
            .as_ref()
            .map(|pair| (pair.access_token.clone(), pair.refresh_token.clone()));

        let Some((access_token, refresh_token)) = held else {
            let pair = self.acquire().await?;
            let header = pair.header();
            inner.tokens = Some(pair);
            inner.state = TokenState::Valid;
            return Ok(header);
        };

        if self.probe(&access_token).await? {
            inner.state = TokenState::Valid;
            return Ok(AuthorizationHeader::bearer(&access_token));
        }

        inner.state = TokenState::Expired;
        let pair = match refresh_token {
            Some(refresh_token) => {
                info!("access token rejected, refreshing");
                match self.refresh(&refresh_token).await {
                    Ok(pair) => pair,
                    Err(e) => {
                        // A rejected refresh token is never sent again; the
                        // next call re-acquires.
                        if let Some(pair) = inner.tokens.as_mut() {
                            pair.refresh_token = None;
                        }
                        return Err(e);
                    }
                }
            }
            None => {
                info!("access token rejected and no refresh token held, re-acquiring");
                self.acquire().await?
            }
        };

        let header = pair.header();
        inner.tokens = Some(pair);
        inner.state = TokenState::Valid;
        Ok(header)
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("base", &self.base.as_url().as_str())
            .field("app_id", &self.credentials.app_id)
            .field("policy", &self.policy)
            .finish()
    }
}

fn auth_failure(err: ApiError) -> ApiError {
    match err {
        ApiError::Authentication { .. } => err,
        other => ApiError::Authentication {
            message: other.to_string(),
        },
    }
}

fn non_empty(access: String) -> Result<Secret> {
    if access.is_empty() {
        return Err(ApiError::Authentication {
            message: "token endpoint returned an empty access token".to_string(),
        });
    }
    Ok(Secret::new(access))
}
