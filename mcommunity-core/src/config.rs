//! Client configuration.
//!
//! Settings are read from a TOML file and then overridden by environment
//! variables named `MCOMMUNITY_<FIELD>`:
//!
//! ```toml
//! api_uri = "https://mcommunity-api.example.edu"
//! app_id = "uid=my-app,ou=Applications,o=services"
//! app_password = "..."
//! group_name = "api-examples-group"
//! uniqname = "bjensen"
//! ```
//!
//! Without an explicit path the file is looked up at
//! `<config dir>/mcommunity/config.toml`.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::secret::Secret;
use crate::token::RefreshTokenPolicy;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MCOMMUNITY";

/// Path used to probe whether an access token is still accepted.
pub const DEFAULT_PROBE_PATH: &str = "groups/";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the directory API.
    pub api_uri: String,

    /// Application ID (DN) used as the token endpoint username.
    pub app_id: Option<String>,

    /// Application password.
    pub app_password: Option<Secret>,

    /// Group used by the group examples when none is given.
    pub group_name: Option<String>,

    /// Person used by the people examples when none is given.
    pub uniqname: Option<String>,

    /// What happens to the refresh token after a refresh.
    pub refresh_token_policy: RefreshTokenPolicy,

    /// Protected endpoint used for token validity probes.
    pub probe_path: Option<String>,

    /// Request timeout applied to every HTTP call.
    pub timeout_secs: Option<u64>,
}

/// Application identity used to obtain tokens.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: Secret,
}

impl Credentials {
    /// Create credentials from an application ID and password.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<Secret>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL.
    pub fn new(api_uri: impl Into<String>) -> Self {
        Self {
            api_uri: api_uri.into(),
            ..Self::default()
        }
    }

    /// Set the application ID and password.
    pub fn with_credentials(mut self, app_id: impl Into<String>, password: impl Into<Secret>) -> Self {
        self.app_id = Some(app_id.into());
        self.app_password = Some(password.into());
        self
    }

    /// Set what happens to the refresh token after a refresh.
    pub fn with_refresh_token_policy(mut self, policy: RefreshTokenPolicy) -> Self {
        self.refresh_token_policy = policy;
        self
    }

    /// Load configuration from `path` (or the default location) and apply
    /// environment overrides.
    ///
    /// An explicit path must exist. A missing default file is not an error;
    /// the environment alone may then supply everything.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("loading configuration from {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|e| ApiError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;

        toml::from_str(&contents).map_err(|e| ApiError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Override fields from `MCOMMUNITY_*` variables looked up through `lookup`.
    ///
    /// Fails if `REFRESH_TOKEN_POLICY` or `TIMEOUT_SECS` cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |field: &str| lookup(&format!("{}_{}", ENV_PREFIX, field));

        if let Some(value) = var("API_URI") {
            self.api_uri = value;
        }
        if let Some(value) = var("APP_ID") {
            self.app_id = Some(value);
        }
        if let Some(value) = var("APP_PASSWORD") {
            self.app_password = Some(Secret::new(value));
        }
        if let Some(value) = var("GROUP_NAME") {
            self.group_name = Some(value);
        }
        if let Some(value) = var("UNIQNAME") {
            self.uniqname = Some(value);
        }
        if let Some(value) = var("REFRESH_TOKEN_POLICY") {
            self.refresh_token_policy = value.parse().map_err(|message| ApiError::Config { message })?;
        }
        if let Some(value) = var("PROBE_PATH") {
            self.probe_path = Some(value);
        }
        if let Some(value) = var("TIMEOUT_SECS") {
            let secs = value.trim().parse().map_err(|e| ApiError::Config {
                message: format!("invalid {}_TIMEOUT_SECS {:?}: {}", ENV_PREFIX, value, e),
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_uri.trim().is_empty() {
            return Err(ApiError::Config {
                message: format!("api_uri is not set (config file or {}_API_URI)", ENV_PREFIX),
            });
        }
        Ok(())
    }

    /// Application credentials, required only for authenticated endpoints.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.app_id, &self.app_password) {
            (Some(id), Some(password)) if !id.is_empty() => Ok(Credentials::new(id.clone(), password.clone())),
            _ => Err(ApiError::Config {
                message: format!(
                    "app_id and app_password are required ({0}_APP_ID, {0}_APP_PASSWORD)",
                    ENV_PREFIX
                ),
            }),
        }
    }

    pub fn probe_path(&self) -> &str {
        self.probe_path.as_deref().unwrap_or(DEFAULT_PROBE_PATH)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// `<config dir>/mcommunity/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mcommunity").map(|dirs| dirs.config_dir().join("config.toml"))
}
