//! # vcdkit Auth - Connection Fingerprints and Credential Dispatch
//!
//! Turns a [`ConnectionConfig`] into a cache key and into exactly one
//! credential mechanism, then applies that mechanism to a session handle.
//!
//! ## Architecture
//!
//! - [`config`] - `ConnectionConfig` and its builder
//! - [`fingerprint`] - SHA-256 cache key over every identity-bearing field
//! - [`credentials`] - `AuthMethod` resolution with fixed priority
//! - [`dispatcher`] - the `Authenticator` trait and [`dispatch`]
//! - [`token_file`] - API token and service-account token files
//! - [`error`] - `AuthError`
//!
//! ## Quick Start
//!
//! ```rust
//! use vcdkit_auth::{AuthMethod, AuthMethodKind, ConnectionConfig};
//!
//! let config = ConnectionConfig::builder()
//!     .user("admin")
//!     .password("secret")
//!     .sys_org("System")
//!     .href("https://vcd.example.com/api")
//!     .build();
//!
//! let key = config.fingerprint();
//! assert_eq!(key.as_str().len(), 64);
//!
//! let method = AuthMethod::resolve(&config);
//! assert_eq!(method.kind(), AuthMethodKind::Password);
//! ```
//!
//! ## Credential Priority
//!
//! When more than one credential is configured the first populated one wins:
//! service-account token file, API token file, API token, token, password.

pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod fingerprint;
pub mod token_file;

#[doc(inline)]
pub use config::{ConnectionConfig, ConnectionConfigBuilder, SYSTEM_ORG, is_system_org};

#[doc(inline)]
pub use credentials::{AuthMethod, AuthMethodKind, LEGACY_TOKEN_MAX_LEN, TokenHeader};

#[doc(inline)]
pub use dispatcher::{Authenticator, dispatch};

#[doc(inline)]
pub use error::{AuthError, AuthResult};

#[doc(inline)]
pub use fingerprint::{FINGERPRINT_LEN, Fingerprint, fingerprint};

#[doc(inline)]
pub use secrecy::{ExposeSecret, SecretString};
