//! Commonly used types

pub use crate::{
    CacheStats, ClientError, ClientFactory, ClientResult, Clock, FactorySettings, HttpSession,
    HttpSessionBuilder, SessionBuilder, SessionCache, SystemClock,
};
pub use vcdkit_auth::{AuthError, AuthMethod, AuthMethodKind, Authenticator, ConnectionConfig};
