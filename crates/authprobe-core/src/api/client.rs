//! API client for the SoportePlus authentication endpoints.
//!
//! This module provides the `ApiClient` struct for logging in, fetching the
//! current user with a bearer token, and probing the CORS preflight of the
//! login route.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::auth::Credentials;
use crate::models::{CurrentUserResponse, LoginRequest, LoginResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Login route, relative to the API base URL
const LOGIN_PATH: &str = "/auth/login";

/// Current-user route, relative to the API base URL
const ME_PATH: &str = "/auth/me";

/// Prefix shared by all CORS response headers
const CORS_HEADER_PREFIX: &str = "access-control-";

/// Result of an `OPTIONS` preflight against the login route.
#[derive(Debug, Clone)]
pub struct Preflight {
    pub status: u16,
    /// `access-control-*` headers, lowercased names, in response order
    pub cors_headers: Vec<(String, String)>,
}

impl Preflight {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.cors_headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the server would let a browser at `origin` make the call
    pub fn allows_origin(&self, origin: &str) -> bool {
        matches!(self.header("access-control-allow-origin"), Some(o) if o == "*" || o == origin)
    }
}

/// API client for the authentication service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://127.0.0.1:5000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Read a successful response body and parse it as JSON
    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T> {
        let text = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read response body from {}", url))?;
        debug!(url = url, bytes = text.len(), "Response received");

        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Authentication =====

    /// Log in with email and password.
    ///
    /// Returns the parsed login body; the access token is at
    /// `tokens.access_token`. Failures are logged here and returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        match self.send_login(credentials).await {
            Ok(login) => {
                info!(email = %credentials.email, "Login succeeded");
                Ok(login)
            }
            Err(e) => {
                error!(email = %credentials.email, error = %format!("{:#}", e), "Login failed");
                Err(e)
            }
        }
    }

    async fn send_login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let url = self.url(LOGIN_PATH);
        let body = LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send login request to {}", url))?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    /// Fetch the user the current bearer token belongs to.
    ///
    /// The token is not checked first: without one the request goes out
    /// unauthenticated and the server's answer decides the outcome.
    pub async fn current_user(&self) -> Result<CurrentUserResponse> {
        match self.send_current_user().await {
            Ok(me) => {
                info!(user_id = ?me.user_id(), "Fetched current user");
                Ok(me)
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Fetching current user failed");
                Err(e)
            }
        }
    }

    async fn send_current_user(&self) -> Result<CurrentUserResponse> {
        let url = self.url(ME_PATH);
        let mut request = self
            .client
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json");
        // A token that is not a valid header value surfaces as a send error
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        } else {
            debug!("No bearer token set, sending unauthenticated request");
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    /// Send a CORS preflight for the login route as a browser at `origin` would.
    /// Any status is returned as-is; only transport failures are errors.
    pub async fn preflight(&self, origin: &str) -> Result<Preflight> {
        let url = self.url(LOGIN_PATH);

        let response = self
            .client
            .request(Method::OPTIONS, &url)
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send OPTIONS request to {}", url))?;

        let cors_headers = response
            .headers()
            .iter()
            .filter(|(name, _)| name.as_str().starts_with(CORS_HEADER_PREFIX))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let preflight = Preflight {
            status: response.status().as_u16(),
            cors_headers,
        };
        info!(status = preflight.status, origin = origin, "Preflight answered");
        Ok(preflight)
    }
}
