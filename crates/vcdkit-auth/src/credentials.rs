//! Credential resolution
//!
//! A [`ConnectionConfig`] carries its credential as a flat set of optional
//! fields. [`AuthMethod::resolve`] turns that set into exactly one credential
//! mechanism using a fixed priority:
//!
//! 1. service-account token file
//! 2. API token file
//! 3. API token
//! 4. token (bearer or legacy, by length)
//! 5. user name and password
//!
//! Ambiguous input is not rejected. The highest-priority credential wins and a
//! warning names the ones that were ignored.

use std::fmt;
use std::path::PathBuf;

use secrecy::SecretString;
use tracing::warn;

use super::config::{ConnectionConfig, is_set};

/// Tokens longer than this many characters are bearer tokens.
pub const LEGACY_TOKEN_MAX_LEN: usize = 32;

/// Header used to present a token to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenHeader {
    /// `authorization: Bearer <token>`
    Bearer,
    /// `x-vcloud-authorization: <token>`
    Legacy,
}

impl TokenHeader {
    /// Classify a token by length
    #[must_use]
    pub fn for_token(token: &str) -> Self {
        if token.chars().count() > LEGACY_TOKEN_MAX_LEN {
            TokenHeader::Bearer
        } else {
            TokenHeader::Legacy
        }
    }

    /// Header name
    #[must_use]
    pub fn header_name(self) -> &'static str {
        match self {
            TokenHeader::Bearer => "authorization",
            TokenHeader::Legacy => "x-vcloud-authorization",
        }
    }

    /// Header value carrying `token`
    #[must_use]
    pub fn header_value(self, token: &str) -> String {
        match self {
            TokenHeader::Bearer => format!("Bearer {token}"),
            TokenHeader::Legacy => token.to_string(),
        }
    }
}

/// Credential kind without the secret material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethodKind {
    /// Service-account token file
    ServiceAccountTokenFile,
    /// API token file
    ApiTokenFile,
    /// API token
    ApiToken,
    /// Bearer or legacy token
    Token,
    /// User name and password
    Password,
}

impl AuthMethodKind {
    /// Stable identifier for logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethodKind::ServiceAccountTokenFile => "service_account_token_file",
            AuthMethodKind::ApiTokenFile => "api_token_file",
            AuthMethodKind::ApiToken => "api_token",
            AuthMethodKind::Token => "token",
            AuthMethodKind::Password => "password",
        }
    }
}

impl fmt::Display for AuthMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single credential mechanism used for a connection
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Exchange the refresh token held in a service-account file
    ServiceAccountTokenFile(PathBuf),
    /// Exchange the API token held in a file
    ApiTokenFile(PathBuf),
    /// Exchange an API token
    ApiToken(SecretString),
    /// Present a token directly
    Token(SecretString),
    /// Log in with user name and password
    Password {
        /// User name
        user: String,
        /// Password
        password: SecretString,
    },
}

impl AuthMethod {
    /// Pick the credential mechanism for `config`
    ///
    /// Always succeeds. When no credential field is populated the result is
    /// password authentication with whatever user and password are present,
    /// and the server decides.
    pub fn resolve(config: &ConnectionConfig) -> Self {
        let populated = populated_kinds(config);

        if populated.len() > 1 {
            let ignored: Vec<&str> = populated[1..].iter().map(|kind| kind.as_str()).collect();
            warn!(
                selected = %populated[0],
                ?ignored,
                "Multiple credentials configured, using highest-priority credential"
            );
        }

        match populated.first() {
            Some(AuthMethodKind::ServiceAccountTokenFile) => {
                AuthMethod::ServiceAccountTokenFile(PathBuf::from(
                    &config.service_account_token_file,
                ))
            }
            Some(AuthMethodKind::ApiTokenFile) => {
                AuthMethod::ApiTokenFile(PathBuf::from(&config.api_token_file))
            }
            Some(AuthMethodKind::ApiToken) => AuthMethod::ApiToken(config.api_token.clone()),
            Some(AuthMethodKind::Token) => AuthMethod::Token(config.token.clone()),
            Some(AuthMethodKind::Password) | None => AuthMethod::Password {
                user: config.user.clone(),
                password: config.password.clone(),
            },
        }
    }

    /// Credential kind
    #[must_use]
    pub fn kind(&self) -> AuthMethodKind {
        match self {
            AuthMethod::ServiceAccountTokenFile(_) => AuthMethodKind::ServiceAccountTokenFile,
            AuthMethod::ApiTokenFile(_) => AuthMethodKind::ApiTokenFile,
            AuthMethod::ApiToken(_) => AuthMethodKind::ApiToken,
            AuthMethod::Token(_) => AuthMethodKind::Token,
            AuthMethod::Password { .. } => AuthMethodKind::Password,
        }
    }
}

/// Populated credential kinds, highest priority first
fn populated_kinds(config: &ConnectionConfig) -> Vec<AuthMethodKind> {
    [
        (
            AuthMethodKind::ServiceAccountTokenFile,
            !config.service_account_token_file.is_empty(),
        ),
        (AuthMethodKind::ApiTokenFile, !config.api_token_file.is_empty()),
        (AuthMethodKind::ApiToken, is_set(&config.api_token)),
        (AuthMethodKind::Token, is_set(&config.token)),
        (AuthMethodKind::Password, is_set(&config.password)),
    ]
    .into_iter()
    .filter(|(_, populated)| *populated)
    .map(|(kind, _)| kind)
    .collect()
}
