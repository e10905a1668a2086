//! Connection Configuration
//!
//! The parameter bundle a caller hands over to obtain an authenticated session:
//! endpoint, organization scope, and one of several credential forms.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::fingerprint::{Fingerprint, fingerprint};

/// Organization name that denotes the provider (super-administrative) scope.
///
/// Compared case-insensitively.
pub const SYSTEM_ORG: &str = "System";

/// Connection parameters for a cloud director endpoint
///
/// Absent string fields are empty. At most one of `password`, `token`,
/// `api_token`, `api_token_file` and `service_account_token_file` is expected
/// to be populated; when several are, [`crate::AuthMethod::resolve`] picks one
/// by fixed priority.
///
/// Secret fields are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Principal user name (password authentication)
    pub user: String,
    /// Password for `user`
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub password: SecretString,
    /// Legacy authorization token or bearer token
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub token: SecretString,
    /// API token (exchanged for a bearer token)
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub api_token: SecretString,
    /// Path to a JSON file holding an API token
    pub api_token_file: String,
    /// Path to a JSON file holding a service-account refresh token
    pub service_account_token_file: String,
    /// Organization the credential is validated against
    pub sys_org: String,
    /// Default organization for subsequent operations
    pub org: String,
    /// Default virtual datacenter for subsequent operations
    pub vdc: String,
    /// Endpoint URL, e.g. `https://vcd.example.com/api`
    pub href: String,
    /// Skip TLS certificate verification
    pub insecure: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: empty_secret(),
            token: empty_secret(),
            api_token: empty_secret(),
            api_token_file: String::new(),
            service_account_token_file: String::new(),
            sys_org: String::new(),
            org: String::new(),
            vdc: String::new(),
            href: String::new(),
            insecure: false,
        }
    }
}

impl ConnectionConfig {
    /// Create a builder
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Whether `sys_org` names the provider scope
    #[must_use]
    pub fn is_provider(&self) -> bool {
        is_system_org(&self.sys_org)
    }

    /// Cache key for this configuration
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(self)
    }
}

/// Whether `org` names the provider scope (case-insensitive)
#[must_use]
pub fn is_system_org(org: &str) -> bool {
    org.eq_ignore_ascii_case(SYSTEM_ORG)
}

/// Whether a secret holds anything
pub(crate) fn is_set(secret: &SecretString) -> bool {
    !secret.expose_secret().is_empty()
}

pub(crate) fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

// Custom serialization for SecretString
pub(crate) fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

// Custom deserialization for SecretString
pub(crate) fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(SecretString::from(s))
}

/// Builder for [`ConnectionConfig`]
#[derive(Debug, Default, Clone)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the principal user name
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.config.user = user.into();
        self
    }

    /// Set the password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = SecretString::from(password.into());
        self
    }

    /// Set a legacy or bearer token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = SecretString::from(token.into());
        self
    }

    /// Set an API token
    pub fn api_token(mut self, api_token: impl Into<String>) -> Self {
        self.config.api_token = SecretString::from(api_token.into());
        self
    }

    /// Set the API token file path
    pub fn api_token_file(mut self, path: impl Into<String>) -> Self {
        self.config.api_token_file = path.into();
        self
    }

    /// Set the service-account token file path
    pub fn service_account_token_file(mut self, path: impl Into<String>) -> Self {
        self.config.service_account_token_file = path.into();
        self
    }

    /// Set the authentication-scope organization
    pub fn sys_org(mut self, org: impl Into<String>) -> Self {
        self.config.sys_org = org.into();
        self
    }

    /// Set the default organization
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.config.org = org.into();
        self
    }

    /// Set the default virtual datacenter
    pub fn vdc(mut self, vdc: impl Into<String>) -> Self {
        self.config.vdc = vdc.into();
        self
    }

    /// Set the endpoint URL
    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.config.href = href.into();
        self
    }

    /// Relax TLS certificate verification
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.config.insecure = insecure;
        self
    }

    /// Finish building
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_populates_fields() {
        let config = ConnectionConfig::builder()
            .user("admin")
            .password("pw")
            .sys_org("System")
            .org("tenant1")
            .vdc("vdc1")
            .href("https://host/api")
            .insecure(true)
            .build();

        assert_eq!(config.user, "admin");
        assert_eq!(config.org, "tenant1");
        assert_eq!(config.vdc, "vdc1");
        assert!(config.insecure);
        assert_eq!(config.password.expose_secret(), "pw");
        assert!(!is_set(&config.token));
    }

    #[test]
    fn test_is_provider_case_insensitive() {
        for org in ["System", "system", "SYSTEM", "sYsTeM"] {
            let config = ConnectionConfig::builder().sys_org(org).build();
            assert!(config.is_provider(), "{org} should be the provider scope");
        }
        assert!(!ConnectionConfig::builder().sys_org("tenant").build().is_provider());
        assert!(!ConnectionConfig::default().is_provider());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ConnectionConfig::builder()
            .user("admin")
            .password("hunter2")
            .api_token("secret-api-token")
            .build();

        let debug = format!("{config:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret-api-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{"user": "admin", "password": "pw", "href": "https://host/api"}"#,
        )
        .unwrap();

        assert_eq!(config.user, "admin");
        assert_eq!(config.sys_org, "");
        assert_eq!(config.password.expose_secret(), "pw");
        assert!(!is_set(&config.api_token));
        assert!(!config.insecure);
    }

    #[test]
    fn test_serialize_omits_secrets() {
        let config = ConnectionConfig::builder()
            .user("admin")
            .password("hunter2")
            .token("legacy-token")
            .api_token("secret-api-token")
            .href("https://host/api")
            .build();

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("admin"));
        for secret in ["hunter2", "legacy-token", "secret-api-token", "password"] {
            assert!(!json.contains(secret), "{secret} leaked into {json}");
        }

        // Reading it back yields the same non-secret fields and empty secrets
        let restored: ConnectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.href, config.href);
        assert!(!is_set(&restored.password));
    }
}
