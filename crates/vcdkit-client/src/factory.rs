//! Client factory
//!
//! [`ClientFactory::get_client`] turns a [`ConnectionConfig`] into an
//! authenticated session:
//!
//! 1. fingerprint the configuration
//! 2. with caching on, reuse a live cached session (no network activity) or
//!    evict an expired one
//! 3. validate the endpoint URL
//! 4. build a session and authenticate it with the resolved credential
//! 5. cache the session on success; cache nothing on failure
//!
//! The cache lock is released before step 3. Two cold callers with the same
//! configuration may therefore both authenticate; the later store wins.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;
use vcdkit_auth::{AuthMethod, ConnectionConfig, Fingerprint, dispatch};

use crate::cache::{CacheEntry, CacheStats, Lookup, SessionCache};
use crate::clock::{Clock, SystemClock};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionBuilder;
use crate::settings::FactorySettings;
use crate::user_agent::user_agent;

/// Produces authenticated sessions, reusing them while they are fresh
///
/// Owns its [`SessionCache`]. Share one factory (for example behind an `Arc`)
/// wherever sessions should be reused; separate factories never share
/// sessions.
pub struct ClientFactory<B: SessionBuilder> {
    builder: B,
    settings: FactorySettings,
    cache: SessionCache<B::Session>,
    clock: Arc<dyn Clock>,
}

impl<B: SessionBuilder> ClientFactory<B> {
    /// Create a factory with an empty cache and the system clock
    pub fn new(builder: B, settings: FactorySettings) -> Self {
        Self {
            builder,
            settings,
            cache: SessionCache::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for session ages
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return an authenticated session for `config`
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidEndpoint`] when `config.href` is not an
    ///   absolute URL with a host
    /// - [`ClientError::SessionBuild`] when the session cannot be constructed
    /// - [`ClientError::Authentication`] when the credential is rejected
    ///
    /// A failed call never leaves an entry in the cache.
    pub async fn get_client(&self, config: &ConnectionConfig) -> ClientResult<Arc<B::Session>> {
        let fingerprint = config.fingerprint();

        if self.settings.cache_enabled {
            match self
                .cache
                .checkout(&fingerprint, self.settings.ttl, self.clock.now())
            {
                Lookup::Hit(session) => {
                    debug!(fingerprint = fingerprint.short(), "Reusing cached session");
                    return Ok(session);
                }
                Lookup::Expired { age } => {
                    warn!(
                        fingerprint = fingerprint.short(),
                        age_secs = age.as_secs(),
                        "Cached session expired, re-authenticating"
                    );
                }
                Lookup::Miss => {
                    debug!(fingerprint = fingerprint.short(), "No cached session");
                }
            }
        }

        let session = self.authenticate(config, &fingerprint).await?;

        if self.settings.cache_enabled {
            self.cache.store(
                fingerprint,
                CacheEntry::new(self.clock.now(), Arc::clone(&session)),
            );
        }

        Ok(session)
    }

    /// Drop every cached session
    ///
    /// Call after any operation that changes the rights of a principal whose
    /// session may be cached.
    pub fn reset_cache(&self) {
        self.cache.reset();
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The underlying cache
    pub fn cache(&self) -> &SessionCache<B::Session> {
        &self.cache
    }

    /// Factory settings
    pub fn settings(&self) -> &FactorySettings {
        &self.settings
    }

    async fn authenticate(
        &self,
        config: &ConnectionConfig,
        fingerprint: &Fingerprint,
    ) -> ClientResult<Arc<B::Session>> {
        let endpoint = parse_endpoint(&config.href)?;
        let agent = user_agent(
            &self.settings.product,
            &self.settings.version,
            config.is_provider(),
        );

        let mut session = self
            .builder
            .build(&endpoint, config.insecure, &agent)
            .map_err(ClientError::SessionBuild)?;

        let method = AuthMethod::resolve(config);
        dispatch(&mut session, &method, &config.sys_org)
            .await
            .map_err(|source| {
                warn!(
                    method = %method.kind(),
                    category = source.category(),
                    "Authentication failed: {}",
                    source
                );
                ClientError::Authentication {
                    method: method.kind(),
                    source,
                }
            })?;

        info!(
            fingerprint = fingerprint.short(),
            method = %method.kind(),
            endpoint = %endpoint,
            "Established new session"
        );
        Ok(Arc::new(session))
    }
}

impl<B: SessionBuilder + std::fmt::Debug> std::fmt::Debug for ClientFactory<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("builder", &self.builder)
            .field("settings", &self.settings)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Parse and validate an endpoint URL
fn parse_endpoint(href: &str) -> ClientResult<Url> {
    let invalid = |reason: String| ClientError::InvalidEndpoint {
        href: href.to_string(),
        reason,
    };

    let url = Url::parse(href).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(url)
}
