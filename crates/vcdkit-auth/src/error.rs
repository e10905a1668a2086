//! Authentication error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised while establishing an authenticated session
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to access token file {}: {source}", .path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed token file {}: {reason}", .path.display())]
    MalformedTokenFile { path: PathBuf, reason: String },

    #[error("Authentication rejected by server (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server response did not carry a session token")]
    MissingSessionToken,

    #[error("token-based authentication failed: {0}")]
    TokenAuthentication(#[source] Box<AuthError>),

    #[error("Cannot build session client: {0}")]
    Client(String),
}

impl AuthError {
    /// Whether a caller may reasonably try again.
    ///
    /// Only transport failures qualify. Nothing in this workspace retries on
    /// its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Transport(_) => true,
            AuthError::TokenAuthentication(inner) => inner.is_retryable(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AuthError::TokenFile { .. } => "token_file",
            AuthError::MalformedTokenFile { .. } => "malformed_token_file",
            AuthError::Rejected { .. } => "rejected",
            AuthError::Transport(_) => "transport",
            AuthError::MissingSessionToken => "missing_session_token",
            AuthError::TokenAuthentication(_) => "token_authentication",
            AuthError::Client(_) => "client",
        }
    }
}
