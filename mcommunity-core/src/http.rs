//! URL building and raw response capture shared by the authorizer and the
//! resource clients.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::token::AuthorizationHeader;

/// Base URL of the directory API.
///
/// Endpoint URLs are built by appending percent-encoded path segments and a
/// trailing slash, which the API requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase {
    url: Url,
}

impl ApiBase {
    pub fn parse(base: &str) -> Result<Self> {
        let url = Url::parse(base.trim())?;
        if url.cannot_be_a_base() {
            return Err(ApiError::Config {
                message: format!("API URI cannot be used as a base: {}", base),
            });
        }
        Ok(Self { url })
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// `<base>/<seg>/<seg>/.../`, each segment encoded on its own.
    pub fn join(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| ApiError::Config {
                message: format!("API URI cannot be used as a base: {}", self.url),
            })?;
            path.pop_if_empty();
            path.extend(segments);
            path.push("");
        }
        Ok(url)
    }

    /// Join a slash-separated relative path such as `token/refresh/`.
    pub fn join_path(&self, path: &str) -> Result<Url> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.join(&segments)
    }
}

/// A response as received: status and raw body, untouched.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: Method,
    pub url: Url,
    /// JSON body sent with the request, if any.
    pub request_body: Option<Value>,
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// The body as untyped JSON. Empty bodies (204, renew, expire) are `null`.
    pub fn json_value(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        self.json()
    }

    /// Classify a non-success response into an [`ApiError`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, self.body))
        }
    }

    /// Require an exact status, as the group lifecycle endpoints document.
    pub fn expect_status(self, expected: StatusCode) -> Result<Self> {
        let response = self.into_result()?;
        if response.status != expected {
            return Err(ApiError::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

/// Build the HTTP client shared by the authorizer and resource clients.
pub fn build_client(config: &ClientConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Send one request and capture the response without interpreting it.
pub(crate) async fn execute(
    http: &Client,
    method: Method,
    url: Url,
    auth: Option<&AuthorizationHeader>,
    request_body: Option<Value>,
) -> Result<ApiResponse> {
    debug!(%method, %url, authenticated = auth.is_some(), "sending request");

    let mut request = http.request(method.clone(), url.clone());
    if let Some(header) = auth {
        let (name, value) = header.to_header().map_err(|e| ApiError::Authentication {
            message: format!("access token is not a valid header value: {}", e),
        })?;
        request = request.header(name, value);
    }
    if let Some(body) = &request_body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    debug!(%method, %url, status = status.as_u16(), "received response");

    Ok(ApiResponse {
        method,
        url,
        request_body,
        status,
        body,
    })
}
