//! Session handles
//!
//! A [`SessionBuilder`] constructs an unauthenticated session for an endpoint.
//! The session is then authenticated in place through
//! [`vcdkit_auth::Authenticator`] and frozen behind an `Arc` before anyone
//! else sees it.
//!
//! [`HttpSessionBuilder`] and [`HttpSession`] talk to a cloud director
//! endpoint over HTTPS.

mod http;

pub use http::{
    ACCESS_TOKEN_HEADER, DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT, HttpSession,
    HttpSessionBuilder,
};

use url::Url;
use vcdkit_auth::{AuthResult, Authenticator};

/// Creates session handles
pub trait SessionBuilder: Send + Sync {
    /// Session type produced
    type Session: Authenticator + 'static;

    /// Build an unauthenticated session for `endpoint`
    ///
    /// `insecure` relaxes TLS verification. `user_agent` identifies the caller
    /// on every request the session makes.
    fn build(&self, endpoint: &Url, insecure: bool, user_agent: &str)
    -> AuthResult<Self::Session>;
}
