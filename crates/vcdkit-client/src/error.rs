//! Client factory error types

use thiserror::Error;
use vcdkit_auth::{AuthError, AuthMethodKind};

/// Result type for client factory operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`crate::ClientFactory::get_client`]
#[derive(Error, Debug)]
pub enum ClientError {
    /// The endpoint URL is not a well-formed absolute URL. Never retried.
    #[error("Invalid endpoint URL '{href}': {reason}")]
    InvalidEndpoint { href: String, reason: String },

    /// The session handle could not be constructed
    #[error("Failed to build session: {0}")]
    SessionBuild(#[source] AuthError),

    /// The selected credential was not accepted
    #[error("Authentication with {method} failed: {source}")]
    Authentication {
        method: AuthMethodKind,
        #[source]
        source: AuthError,
    },
}

impl ClientError {
    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, ClientError::InvalidEndpoint { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ClientError::InvalidEndpoint { .. } => "configuration",
            ClientError::SessionBuild(_) => "session_build",
            ClientError::Authentication { .. } => "authentication",
        }
    }
}
