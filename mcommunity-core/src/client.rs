//! Directory API client.
//!
//! [`DirectoryClient`] owns the HTTP client, the base URL and the
//! [`AuthHeaderProvider`] used for authenticated endpoints, and hands out the
//! [`People`] and [`Groups`] resource clients.
//!
//! # Example
//!
//! ```no_run
//! use mcommunity_core::{ClientConfig, DirectoryClient, GroupCn, Uniqname};
//!
//! # async fn example() -> mcommunity_core::Result<()> {
//! let config = ClientConfig::load(None)?;
//! let client = DirectoryClient::new(&config)?;
//!
//! let person = client.people().get(&Uniqname::new("bjensen")).await?;
//! println!("{} {}", person.status, person.body);
//!
//! let group = client.groups().get(&GroupCn::new("api-examples-group")).await?;
//! println!("{}", group.into_result()?.body);
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::authorize::{AuthHeaderProvider, Authorizer};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::groups::Groups;
use crate::http::{self, ApiBase, ApiResponse};
use crate::people::People;

pub struct DirectoryClient {
    http: Client,
    base: ApiBase,
    auth: Option<Arc<dyn AuthHeaderProvider>>,
}

impl DirectoryClient {
    /// Build a client from configuration.
    ///
    /// Credentials are optional: without them only public endpoints work.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = http::build_client(config)?;
        let base = ApiBase::parse(&config.api_uri)?;

        let auth: Option<Arc<dyn AuthHeaderProvider>> = match config.credentials() {
            Ok(_) => Some(Arc::new(Authorizer::from_config(config, http.clone())?)),
            Err(_) => {
                debug!("no application credentials configured; authenticated endpoints unavailable");
                None
            }
        };

        Ok(Self { http, base, auth })
    }

    /// Build a client around an existing authorization source.
    pub fn with_auth(base: ApiBase, http: Client, auth: Arc<dyn AuthHeaderProvider>) -> Self {
        Self {
            http,
            base,
            auth: Some(auth),
        }
    }

    /// Build a client for public endpoints only.
    pub fn public(base: ApiBase, http: Client) -> Self {
        Self {
            http,
            base,
            auth: None,
        }
    }

    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    pub fn auth(&self) -> Option<&Arc<dyn AuthHeaderProvider>> {
        self.auth.as_ref()
    }

    pub fn people(&self) -> People<'_> {
        People::new(self)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        self.base.join(segments)
    }

    /// Unauthenticated request.
    pub(crate) async fn send_public<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<ApiResponse> {
        let body = body.map(serde_json::to_value).transpose()?;
        http::execute(&self.http, method, url, None, body).await
    }

    /// Request carrying the current bearer header.
    pub(crate) async fn send_authorized<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<ApiResponse> {
        let auth = self.auth.as_ref().ok_or_else(|| ApiError::Config {
            message: format!("{} requires application credentials", url.path()),
        })?;
        let header = auth.get_auth_header().await?;
        let body = body.map(serde_json::to_value).transpose()?;
        http::execute(&self.http, method, url, Some(&header), body).await
    }
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("base", &self.base.as_url().as_str())
            .field("authenticated", &self.auth.is_some())
            .finish()
    }
}

/// Body type for requests that send none.
pub(crate) type NoBody = ();
