//! HTTP session against a cloud director endpoint
//!
//! Credential flows:
//!
//! - **Password**: `POST /cloudapi/1.0.0/sessions[/provider]` with HTTP Basic
//!   `user@org`; the bearer token comes back in [`ACCESS_TOKEN_HEADER`]
//! - **Token**: header is set, then confirmed with
//!   `GET /cloudapi/1.0.0/sessions/current`
//! - **API token / files**: `POST /oauth/provider/token` or
//!   `/oauth/tenant/{org}/token` with a `refresh_token` grant; the returned
//!   `access_token` is used as a bearer token
//!
//! Paths are resolved against the endpoint with its trailing `/api` segment
//! removed.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};
use url::Url;
use vcdkit_auth::token_file::{
    read_api_token_file, read_service_account_file, write_service_account_file,
};
use vcdkit_auth::{AuthError, AuthResult, Authenticator, TokenHeader, is_system_org};

use super::SessionBuilder;

/// Response header carrying the bearer token after a password login
pub const ACCESS_TOKEN_HEADER: &str = "X-VMWARE-VCLOUD-ACCESS-TOKEN";

/// API version requested in the `Accept` header
pub const DEFAULT_API_VERSION: &str = "37.0";

/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in [`AuthError::Rejected`]
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Builds [`HttpSession`]s
#[derive(Debug, Clone)]
pub struct HttpSessionBuilder {
    api_version: String,
    timeout: Duration,
}

impl Default for HttpSessionBuilder {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl HttpSessionBuilder {
    /// Builder with default API version and timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a different API version
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Change the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SessionBuilder for HttpSessionBuilder {
    type Session = HttpSession;

    fn build(&self, endpoint: &Url, insecure: bool, user_agent: &str) -> AuthResult<HttpSession> {
        let mut client_builder = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(user_agent);

        if insecure {
            warn!(
                endpoint = %endpoint,
                "TLS certificate validation is disabled for this session"
            );
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| AuthError::Client(e.to_string()))?;

        Ok(HttpSession {
            endpoint: endpoint.clone(),
            api_root: api_root(endpoint),
            client,
            api_version: self.api_version.clone(),
            user_agent: user_agent.to_string(),
            authorization: None,
        })
    }
}

/// OAuth token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    access_token: Option<SecretString>,
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    refresh_token: Option<SecretString>,
}

/// Absent, null and empty values all read as `None`
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from))
}

/// Authenticated HTTP session
pub struct HttpSession {
    endpoint: Url,
    api_root: Url,
    client: HttpClient,
    api_version: String,
    user_agent: String,
    authorization: Option<(TokenHeader, SecretString)>,
}

impl fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSession")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_version", &self.api_version)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl HttpSession {
    /// Endpoint this session was built for
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// API version sent in the `Accept` header
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// User agent sent with every request
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Whether a token has been obtained
    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some()
    }

    /// Header used to present the session token
    pub fn token_header(&self) -> Option<TokenHeader> {
        self.authorization.as_ref().map(|(header, _)| *header)
    }

    /// Authorization header name and value
    pub fn authorization_header(&self) -> Option<(&'static str, String)> {
        self.authorization
            .as_ref()
            .map(|(header, token)| {
                (
                    header.header_name(),
                    header.header_value(token.expose_secret()),
                )
            })
    }

    /// Request carrying the session's `Accept` and authorization headers
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, self.accept());
        if let Some((name, value)) = self.authorization_header() {
            request = request.header(name, value);
        }
        request
    }

    /// Resolve path segments against the API root
    pub fn api_url(&self, segments: &[&str]) -> AuthResult<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AuthError::Client(format!("Endpoint {} cannot be a base URL", self.endpoint))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn accept(&self) -> String {
        format!("application/json;version={}", self.api_version)
    }

    /// Returns the access token and, when the server rotated it, the new
    /// refresh token
    async fn exchange_refresh_token(
        &self,
        org: &str,
        refresh_token: &SecretString,
    ) -> AuthResult<(SecretString, Option<SecretString>)> {
        let url = if is_system_org(org) {
            self.api_url(&["oauth", "provider", "token"])?
        } else {
            self.api_url(&["oauth", "tenant", org, "token"])?
        };

        debug!(url = %url, "Exchanging refresh token");
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(transport)?;

        let body = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(transport)?;

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| AuthError::Transport(format!("Invalid token response: {e}")))?;

        let access_token = token.access_token.ok_or(AuthError::MissingSessionToken)?;
        Ok((access_token, token.refresh_token))
    }

    async fn confirm_session(&self) -> AuthResult<()> {
        let url = self.api_url(&["cloudapi", "1.0.0", "sessions", "current"])?;
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Authenticator for HttpSession {
    async fn authenticate_with_password(
        &mut self,
        user: &str,
        password: &SecretString,
        org: &str,
    ) -> AuthResult<()> {
        let url = if is_system_org(org) {
            self.api_url(&["cloudapi", "1.0.0", "sessions", "provider"])?
        } else {
            self.api_url(&["cloudapi", "1.0.0", "sessions"])?
        };

        let response = self
            .client
            .post(url)
            .header(ACCEPT, self.accept())
            .basic_auth(format!("{user}@{org}"), Some(password.expose_secret()))
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;

        let token = response
            .headers()
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
            .ok_or(AuthError::MissingSessionToken)?;

        self.authorization = Some((TokenHeader::Bearer, token));
        info!(user = %user, org = %org, "Authenticated with password");
        Ok(())
    }

    async fn set_token(
        &mut self,
        org: &str,
        header: TokenHeader,
        token: &SecretString,
    ) -> AuthResult<()> {
        self.authorization = Some((header, token.clone()));
        if let Err(e) = self.confirm_session().await {
            self.authorization = None;
            return Err(e);
        }
        info!(org = %org, header = header.header_name(), "Authenticated with token");
        Ok(())
    }

    async fn authenticate_with_api_token(
        &mut self,
        org: &str,
        api_token: &SecretString,
    ) -> AuthResult<()> {
        let (access_token, _) = self.exchange_refresh_token(org, api_token).await?;
        self.authorization = Some((TokenHeader::Bearer, access_token));
        info!(org = %org, "Authenticated with API token");
        Ok(())
    }

    async fn authenticate_with_api_token_file(
        &mut self,
        org: &str,
        path: &Path,
    ) -> AuthResult<()> {
        let file = read_api_token_file(path).await?;
        self.authenticate_with_api_token(org, &file.refresh_token)
            .await
    }

    async fn authenticate_with_service_account_file(
        &mut self,
        org: &str,
        path: &Path,
    ) -> AuthResult<()> {
        let mut file = read_service_account_file(path).await?;
        let (access_token, rotated) = self
            .exchange_refresh_token(org, &file.refresh_token)
            .await?;

        // The old refresh token is spent; persist the new one before anything else
        if let Some(rotated) = rotated {
            file.rotate(rotated, &self.user_agent, Utc::now());
            write_service_account_file(path, &file).await?;
        }

        self.authorization = Some((TokenHeader::Bearer, access_token));
        info!(org = %org, path = %path.display(), "Authenticated with service account");
        Ok(())
    }
}

/// Endpoint with any trailing `/api` segment, query and fragment removed
fn api_root(endpoint: &Url) -> Url {
    let mut root = endpoint.clone();
    let trimmed = endpoint.path().trim_end_matches('/');
    let base = trimmed.strip_suffix("/api").unwrap_or(trimmed).to_string();
    root.set_path(&base);
    root.set_query(None);
    root.set_fragment(None);
    root
}

fn transport(error: reqwest::Error) -> AuthError {
    AuthError::Transport(error.to_string())
}

async fn ensure_success(response: Response) -> AuthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Rejected {
        status: status.as_u16(),
        message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}
