//! Factory settings
//!
//! Cache participation is all-or-nothing. [`FactorySettings::from_env`] reads it
//! from [`CACHE_ENV_VAR`]; the session TTL is a constant.

use std::time::Duration;

/// Environment variable that turns the session cache on
pub const CACHE_ENV_VAR: &str = "VCDKIT_CACHE";

/// Maximum age of a cached session (20 minutes)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(20 * 60);

/// Product tag used in the user agent
pub const PRODUCT_NAME: &str = "vcdkit";

/// Client factory settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorySettings {
    /// Reuse authenticated sessions across calls
    pub cache_enabled: bool,
    /// Maximum age of a cached session
    pub ttl: Duration,
    /// Product tag for the user agent
    pub product: String,
    /// Build version for the user agent
    pub version: String,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            ttl: DEFAULT_SESSION_TTL,
            product: PRODUCT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl FactorySettings {
    /// Settings with caching controlled by [`CACHE_ENV_VAR`]
    ///
    /// The cache is on when the variable is set to anything other than an
    /// empty string, `0`, `false`, `off` or `no`.
    pub fn from_env() -> Self {
        let value = std::env::var(CACHE_ENV_VAR).ok();
        Self {
            cache_enabled: cache_toggle(value.as_deref()),
            ..Self::default()
        }
    }

    /// Same settings with caching turned off
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}

/// Interpret the cache toggle value
pub fn cache_toggle(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"),
    }
}
