//! # vcdkit Client
//!
//! Authenticated-session cache and client factory for cloud director
//! endpoints.
//!
//! ## Features
//!
//! - Sessions keyed by a SHA-256 fingerprint of the full connection
//!   configuration, so distinct credentials never share a session
//! - Time-boxed reuse (20 minutes by default); a cache hit performs no network
//!   activity
//! - One coarse mutex around the store, never held across network calls
//! - Priority-ordered credential dispatch (see [`vcdkit_auth::AuthMethod`])
//! - An HTTP session implementation for password, token, API token and
//!   service-account authentication
//!
//! ## Architecture
//!
//! ```text
//! ConnectionConfig
//!        ↓
//! ClientFactory ──→ fingerprint ──→ SessionCache (hit: return)
//!        ↓ miss / expired
//! SessionBuilder::build ──→ dispatch(AuthMethod) ──→ SessionCache::store
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vcdkit_client::{ClientFactory, FactorySettings, HttpSessionBuilder};
//! use vcdkit_auth::ConnectionConfig;
//!
//! # async fn example() -> Result<(), vcdkit_client::ClientError> {
//! let factory = ClientFactory::new(HttpSessionBuilder::new(), FactorySettings::from_env());
//!
//! let config = ConnectionConfig::builder()
//!     .user("admin")
//!     .password("secret")
//!     .sys_org("System")
//!     .href("https://vcd.example.com/api")
//!     .build();
//!
//! let session = factory.get_client(&config).await?;
//! assert!(session.is_authenticated());
//!
//! // Reused while fresh
//! let again = factory.get_client(&config).await?;
//! # let _ = again;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clock;
pub mod error;
pub mod factory;
pub mod prelude;
pub mod session;
pub mod settings;
pub mod user_agent;

pub use cache::{CacheEntry, CacheStats, Lookup, SessionCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ClientError, ClientResult};
pub use factory::ClientFactory;
pub use session::{HttpSession, HttpSessionBuilder, SessionBuilder};
pub use settings::{CACHE_ENV_VAR, DEFAULT_SESSION_TTL, FactorySettings, PRODUCT_NAME};
pub use user_agent::user_agent;
