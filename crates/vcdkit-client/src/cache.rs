//! Session cache store
//!
//! Maps a connection [`Fingerprint`] to the session authenticated for it.
//! Every operation holds one store-wide mutex for its whole duration, so no
//! caller ever observes a half-applied update. The lock is never held while a
//! session is being built or authenticated.
//!
//! Entries leave the store only through TTL validation on read
//! ([`SessionCache::checkout`]), [`SessionCache::evict`] or
//! [`SessionCache::reset`]. Call `reset` after any operation that changes the
//! rights of the authenticated principal: the store cannot see such
//! operations and would otherwise keep serving a session with stale
//! permissions until it expires.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tracing::debug;
use vcdkit_auth::Fingerprint;

/// Cached session with its creation time
pub struct CacheEntry<S> {
    /// When the session was authenticated
    pub created_at: SystemTime,
    /// Shared session handle
    pub session: Arc<S>,
}

impl<S> CacheEntry<S> {
    /// Create an entry
    pub fn new(created_at: SystemTime, session: Arc<S>) -> Self {
        Self {
            created_at,
            session,
        }
    }

    /// Age at `now`; an entry from the future counts as brand new
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.created_at).unwrap_or(Duration::ZERO)
    }
}

impl<S> Clone for CacheEntry<S> {
    fn clone(&self) -> Self {
        Self {
            created_at: self.created_at,
            session: Arc::clone(&self.session),
        }
    }
}

impl<S> fmt::Debug for CacheEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Outcome of a TTL-validated lookup
pub enum Lookup<S> {
    /// Live session, reused
    Hit(Arc<S>),
    /// An entry existed but was older than the TTL and has been evicted
    Expired {
        /// Age of the evicted entry
        age: Duration,
    },
    /// No entry
    Miss,
}

impl<S> Lookup<S> {
    /// Whether this is a hit
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

impl<S> fmt::Debug for Lookup<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Hit(_) => f.write_str("Hit"),
            Lookup::Expired { age } => f.debug_struct("Expired").field("age", age).finish(),
            Lookup::Miss => f.write_str("Miss"),
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Sessions reused within their TTL
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries evicted because they outlived the TTL
    pub expired: u64,
    /// Entries currently stored
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of validated lookups that were hits (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.expired;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<S> {
    entries: HashMap<Fingerprint, CacheEntry<S>>,
    hits: u64,
    misses: u64,
    expired: u64,
}

/// Mutex-guarded map from fingerprint to authenticated session
pub struct SessionCache<S> {
    inner: Mutex<Inner<S>>,
}

impl<S> SessionCache<S> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                expired: 0,
            }),
        }
    }

    /// Raw lookup without TTL validation or accounting
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<CacheEntry<S>> {
        self.inner.lock().entries.get(fingerprint).cloned()
    }

    /// Insert or overwrite; the last writer wins
    pub fn store(&self, fingerprint: Fingerprint, entry: CacheEntry<S>) {
        let mut inner = self.inner.lock();
        if inner.entries.insert(fingerprint.clone(), entry).is_some() {
            debug!(fingerprint = fingerprint.short(), "Replaced cached session");
        } else {
            debug!(fingerprint = fingerprint.short(), "Cached session");
        }
    }

    /// Remove one entry, reporting whether it existed
    pub fn evict(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.lock().entries.remove(fingerprint).is_some()
    }

    /// Remove every entry
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let cleared = inner.entries.len();
        inner.entries.clear();
        debug!(cleared, "Session cache reset");
    }

    /// TTL-validated lookup
    ///
    /// A hit bumps the hit counter and returns the shared session. An entry
    /// older than `ttl` is evicted in the same critical section and reported
    /// as [`Lookup::Expired`].
    pub fn checkout(&self, fingerprint: &Fingerprint, ttl: Duration, now: SystemTime) -> Lookup<S> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(entry) = inner.entries.get(fingerprint) else {
            inner.misses += 1;
            return Lookup::Miss;
        };

        let age = entry.age(now);
        if age <= ttl {
            let session = Arc::clone(&entry.session);
            inner.hits += 1;
            Lookup::Hit(session)
        } else {
            inner.entries.remove(fingerprint);
            inner.expired += 1;
            Lookup::Expired { age }
        }
    }

    /// Sessions reused so far
    pub fn hits(&self) -> u64 {
        self.inner.lock().hits
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            expired: inner.expired,
            entries: inner.entries.len(),
        }
    }
}

impl<S> Default for SessionCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for SessionCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("stats", &self.stats())
            .finish()
    }
}
