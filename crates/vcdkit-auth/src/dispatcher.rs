//! Authentication dispatch
//!
//! [`dispatch`] applies exactly one [`AuthMethod`] to a session. The session
//! type only has to implement [`Authenticator`], which keeps the wire protocol
//! out of this crate.

use std::path::Path;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::credentials::{AuthMethod, TokenHeader};
use super::error::{AuthError, AuthResult};

/// Credential operations a session handle supports
///
/// Every method mutates the session's authorization state in place. Secrets
/// arrive wrapped and are only exposed where they are put on the wire.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in with user name and password under `org`
    async fn authenticate_with_password(
        &mut self,
        user: &str,
        password: &SecretString,
        org: &str,
    ) -> AuthResult<()>;

    /// Present `token` through `header` and confirm it is accepted
    async fn set_token(
        &mut self,
        org: &str,
        header: TokenHeader,
        token: &SecretString,
    ) -> AuthResult<()>;

    /// Exchange an API token for a bearer token
    async fn authenticate_with_api_token(
        &mut self,
        org: &str,
        api_token: &SecretString,
    ) -> AuthResult<()>;

    /// Load an API token from `path` and exchange it
    async fn authenticate_with_api_token_file(&mut self, org: &str, path: &Path)
    -> AuthResult<()>;

    /// Exchange the refresh token stored in a service-account file
    async fn authenticate_with_service_account_file(
        &mut self,
        org: &str,
        path: &Path,
    ) -> AuthResult<()>;
}

/// Authenticate `session` with `method` under `sys_org`
///
/// Token failures are wrapped in [`AuthError::TokenAuthentication`]; every
/// other branch returns the session's error unchanged.
pub async fn dispatch<A>(session: &mut A, method: &AuthMethod, sys_org: &str) -> AuthResult<()>
where
    A: Authenticator + ?Sized,
{
    debug!(method = %method.kind(), org = sys_org, "Dispatching authentication");

    match method {
        AuthMethod::ServiceAccountTokenFile(path) => {
            session
                .authenticate_with_service_account_file(sys_org, path)
                .await
        }
        AuthMethod::ApiTokenFile(path) => {
            session
                .authenticate_with_api_token_file(sys_org, path)
                .await
        }
        AuthMethod::ApiToken(token) => session.authenticate_with_api_token(sys_org, token).await,
        AuthMethod::Token(token) => {
            let header = TokenHeader::for_token(token.expose_secret());
            session
                .set_token(sys_org, header, token)
                .await
                .map_err(|e| AuthError::TokenAuthentication(Box::new(e)))
        }
        AuthMethod::Password { user, password } => {
            session
                .authenticate_with_password(user, password, sys_org)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionConfig;
    use std::path::PathBuf;

    /// Records which operation ran
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
        fail: bool,
    }

    impl Recorder {
        fn outcome(&self) -> AuthResult<()> {
            if self.fail {
                Err(AuthError::Rejected {
                    status: 401,
                    message: "denied".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Authenticator for Recorder {
        async fn authenticate_with_password(
            &mut self,
            user: &str,
            _password: &SecretString,
            org: &str,
        ) -> AuthResult<()> {
            self.calls.push(format!("password:{user}@{org}"));
            self.outcome()
        }

        async fn set_token(
            &mut self,
            org: &str,
            header: TokenHeader,
            _token: &SecretString,
        ) -> AuthResult<()> {
            self.calls.push(format!("token:{header:?}@{org}"));
            self.outcome()
        }

        async fn authenticate_with_api_token(
            &mut self,
            org: &str,
            _api_token: &SecretString,
        ) -> AuthResult<()> {
            self.calls.push(format!("api_token@{org}"));
            self.outcome()
        }

        async fn authenticate_with_api_token_file(
            &mut self,
            org: &str,
            path: &Path,
        ) -> AuthResult<()> {
            self.calls
                .push(format!("api_token_file:{}@{org}", path.display()));
            self.outcome()
        }

        async fn authenticate_with_service_account_file(
            &mut self,
            org: &str,
            path: &Path,
        ) -> AuthResult<()> {
            self.calls
                .push(format!("service_account:{}@{org}", path.display()));
            self.outcome()
        }
    }

    #[tokio::test]
    async fn test_password_dispatch() {
        let mut session = Recorder::default();
        let method = AuthMethod::Password {
            user: "admin".into(),
            password: "pw".into(),
        };
        dispatch(&mut session, &method, "System").await.unwrap();
        assert_eq!(session.calls, vec!["password:admin@System"]);
    }

    #[tokio::test]
    async fn test_short_token_uses_legacy_header() {
        let mut session = Recorder::default();
        dispatch(&mut session, &AuthMethod::Token("short".into()), "org1")
            .await
            .unwrap();
        assert_eq!(session.calls, vec!["token:Legacy@org1"]);
    }

    #[tokio::test]
    async fn test_long_token_uses_bearer_header() {
        let mut session = Recorder::default();
        dispatch(&mut session, &AuthMethod::Token("x".repeat(40).into()), "org1")
            .await
            .unwrap();
        assert_eq!(session.calls, vec!["token:Bearer@org1"]);
    }

    #[tokio::test]
    async fn test_token_failure_is_wrapped() {
        let mut session = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let err = dispatch(&mut session, &AuthMethod::Token("t".into()), "org1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenAuthentication(_)));
        assert!(err.to_string().contains("token-based authentication"));
    }

    #[tokio::test]
    async fn test_other_failures_are_returned_as_is() {
        let mut session = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let err = dispatch(&mut session, &AuthMethod::ApiToken("a".into()), "org1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_exactly_one_branch_runs_for_ambiguous_config() {
        let config = ConnectionConfig::builder()
            .user("admin")
            .password("pw")
            .token("legacy")
            .api_token("api")
            .sys_org("System")
            .build();

        let mut session = Recorder::default();
        dispatch(&mut session, &AuthMethod::resolve(&config), &config.sys_org)
            .await
            .unwrap();
        assert_eq!(session.calls, vec!["api_token@System"]);
    }

    #[tokio::test]
    async fn test_file_branches_pass_paths() {
        let mut session = Recorder::default();
        dispatch(
            &mut session,
            &AuthMethod::ServiceAccountTokenFile(PathBuf::from("/sa.json")),
            "t1",
        )
        .await
        .unwrap();
        dispatch(
            &mut session,
            &AuthMethod::ApiTokenFile(PathBuf::from("/api.json")),
            "t1",
        )
        .await
        .unwrap();
        assert_eq!(
            session.calls,
            vec!["service_account:/sa.json@t1", "api_token_file:/api.json@t1"]
        );
    }
}
