//! Common test utilities for integration tests
//!
//! A counting fake session stands in for the remote API so factory and cache
//! behavior can be observed without a network.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;
use url::Url;
use vcdkit_auth::{AuthError, AuthResult, Authenticator, SecretString, TokenHeader};
use vcdkit_client::SessionBuilder;

/// Install a test-writer subscriber once per test binary
///
/// `RUST_LOG` overrides the default `debug` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// Shared record of what the fakes did
#[derive(Debug, Default)]
pub struct CallLog {
    builds: AtomicUsize,
    authentications: Mutex<Vec<String>>,
    user_agents: Mutex<Vec<String>>,
    fail_auth: AtomicBool,
}

impl CallLog {
    /// Sessions built so far
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Authentication calls, e.g. `"password:admin@System"`
    pub fn authentications(&self) -> Vec<String> {
        self.authentications.lock().unwrap().clone()
    }

    /// Number of authentication calls
    pub fn auth_count(&self) -> usize {
        self.authentications.lock().unwrap().len()
    }

    /// User agents passed to the builder
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().unwrap().clone()
    }

    /// Make every subsequent authentication fail (or succeed again)
    pub fn set_fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }
}

/// Session handle that records its authentication
#[derive(Debug)]
pub struct FakeSession {
    pub id: usize,
    pub endpoint: Url,
    pub insecure: bool,
    pub authenticated_with: Option<String>,
    log: Arc<CallLog>,
    delay: Option<Duration>,
}

impl FakeSession {
    async fn record(&mut self, call: String) -> AuthResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.log.authentications.lock().unwrap().push(call.clone());

        if self.log.fail_auth.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected {
                status: 401,
                message: "invalid credentials".to_string(),
            });
        }
        self.authenticated_with = Some(call);
        Ok(())
    }
}

#[async_trait]
impl Authenticator for FakeSession {
    async fn authenticate_with_password(
        &mut self,
        user: &str,
        _password: &SecretString,
        org: &str,
    ) -> AuthResult<()> {
        self.record(format!("password:{user}@{org}")).await
    }

    async fn set_token(
        &mut self,
        org: &str,
        header: TokenHeader,
        _token: &SecretString,
    ) -> AuthResult<()> {
        self.record(format!("token:{header:?}@{org}")).await
    }

    async fn authenticate_with_api_token(
        &mut self,
        org: &str,
        _api_token: &SecretString,
    ) -> AuthResult<()> {
        self.record(format!("api_token@{org}")).await
    }

    async fn authenticate_with_api_token_file(
        &mut self,
        org: &str,
        path: &Path,
    ) -> AuthResult<()> {
        self.record(format!("api_token_file:{}@{org}", path.display()))
            .await
    }

    async fn authenticate_with_service_account_file(
        &mut self,
        org: &str,
        path: &Path,
    ) -> AuthResult<()> {
        self.record(format!("service_account:{}@{org}", path.display()))
            .await
    }
}

/// Builder producing [`FakeSession`]s
#[derive(Debug, Default)]
pub struct FakeBuilder {
    log: Arc<CallLog>,
    delay: Option<Duration>,
}

impl FakeBuilder {
    /// Builder plus a handle on its call log
    pub fn new() -> (Self, Arc<CallLog>) {
        let builder = Self::default();
        let log = Arc::clone(&builder.log);
        (builder, log)
    }

    /// Authentication sleeps for `delay` first
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl SessionBuilder for FakeBuilder {
    type Session = FakeSession;

    fn build(&self, endpoint: &Url, insecure: bool, user_agent: &str) -> AuthResult<FakeSession> {
        let id = self.log.builds.fetch_add(1, Ordering::SeqCst) + 1;
        self.log
            .user_agents
            .lock()
            .unwrap()
            .push(user_agent.to_string());

        Ok(FakeSession {
            id,
            endpoint: endpoint.clone(),
            insecure,
            authenticated_with: None,
            log: Arc::clone(&self.log),
            delay: self.delay,
        })
    }
}
