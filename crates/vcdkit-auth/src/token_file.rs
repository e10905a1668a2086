//! Token files
//!
//! File-based credentials are small JSON documents:
//!
//! ```json
//! {"token_type": "API Token", "refresh_token": "..."}
//! ```
//!
//! ```json
//! {
//!   "token_type": "Service Account",
//!   "refresh_token": "...",
//!   "updated_by": "vcdkit/0.4.0 (linux/x86_64; isProvider:false)",
//!   "updated_on": "2026-10-17T09:30:00Z"
//! }
//! ```
//!
//! Service-account refresh tokens are single-use: every exchange returns a new
//! one, which must be written back or the account is locked out on the next
//! login.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::config::{deserialize_secret, empty_secret, serialize_secret};
use super::error::{AuthError, AuthResult};

/// `token_type` written for API token files
pub const API_TOKEN_TYPE: &str = "API Token";

/// `token_type` written for service-account files
pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "Service Account";

/// Contents of an API token file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTokenFile {
    /// Token kind label
    #[serde(default)]
    pub token_type: String,
    /// The API token
    #[serde(
        default = "empty_secret",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub refresh_token: SecretString,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contents of a service-account token file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountTokenFile {
    /// Token kind label
    #[serde(default)]
    pub token_type: String,
    /// Current refresh token
    #[serde(
        default = "empty_secret",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub refresh_token: SecretString,
    /// Agent that last rotated the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// When the token was last rotated (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<String>,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceAccountTokenFile {
    /// Replace the refresh token after an exchange
    pub fn rotate(&mut self, refresh_token: SecretString, updated_by: &str, now: DateTime<Utc>) {
        self.refresh_token = refresh_token;
        self.updated_by = Some(updated_by.to_string());
        self.updated_on = Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));
        if self.token_type.is_empty() {
            self.token_type = SERVICE_ACCOUNT_TOKEN_TYPE.to_string();
        }
    }
}

/// Read and validate an API token file
pub async fn read_api_token_file(path: &Path) -> AuthResult<ApiTokenFile> {
    let file: ApiTokenFile = read_json(path).await?;
    require_refresh_token(path, &file.refresh_token)?;
    Ok(file)
}

/// Read and validate a service-account token file
pub async fn read_service_account_file(path: &Path) -> AuthResult<ServiceAccountTokenFile> {
    let file: ServiceAccountTokenFile = read_json(path).await?;
    require_refresh_token(path, &file.refresh_token)?;
    Ok(file)
}

/// Persist a service-account token file
pub async fn write_service_account_file(
    path: &Path,
    file: &ServiceAccountTokenFile,
) -> AuthResult<()> {
    let body = serde_json::to_vec_pretty(file).map_err(|e| AuthError::MalformedTokenFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tokio::fs::write(path, body)
        .await
        .map_err(|source| AuthError::TokenFile {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), "Service account token file updated");
    Ok(())
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> AuthResult<T> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|source| AuthError::TokenFile {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_slice(&raw).map_err(|e| AuthError::MalformedTokenFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn require_refresh_token(path: &Path, refresh_token: &SecretString) -> AuthResult<()> {
    if refresh_token.expose_secret().trim().is_empty() {
        return Err(AuthError::MalformedTokenFile {
            path: PathBuf::from(path),
            reason: "missing refresh_token".to_string(),
        });
    }
    Ok(())
}
