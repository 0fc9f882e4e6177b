//! Session lifecycle management
//!
//! The session manager owns every transition of the authenticated session:
//! login, logout, automatic access-token refresh, and silent restoration from
//! the persisted auth record. It is the sole writer of both the in-memory
//! token state and the durable record.
//!
//! A session is all-or-nothing: either username, access token, and refresh
//! token are all held, or none are. Any failure along the refresh path tears
//! the whole session down rather than leaving a partial state behind.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use validator::Validate;

use moneta_protocol::{
    AuthErrorResponse, TokenObtainRequest, TokenPairResponse, TokenRefreshRequest,
    TokenRefreshResponse,
};

use crate::config::ClientConfig;
use crate::error::{MonetaError, Result};
use crate::store::{AuthRecordStore, PersistedAuthRecord};

/// Window before access-token expiry in which a call proactively refreshes
/// instead of risking a 401, minutes.
pub const REFRESH_GRACE_MINUTES: i64 = 2;

/// Access-token lifetime assumed when a session is adopted from the persisted
/// record. Deliberately not trusted from the original issuance time; every
/// subsequent call still goes through the refresh check.
const RESTORED_ACCESS_MINUTES: i64 = 30;

/// Remote identity provider seam
///
/// The HTTP implementation talks to the token endpoints; tests script one.
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for an access/refresh token pair
    fn obtain_tokens(
        &self,
        request: &TokenObtainRequest,
    ) -> impl std::future::Future<Output = Result<TokenPairResponse>> + Send;

    /// Exchange a refresh token for a new access token
    fn refresh_access(
        &self,
        request: &TokenRefreshRequest,
    ) -> impl std::future::Future<Output = Result<TokenRefreshResponse>> + Send;
}

/// HTTP identity provider against `/authentication/token/` endpoints
#[derive(Debug)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpIdentityProvider {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self { client, config })
    }

    /// Extract the server-side detail from a 401/4xx token-endpoint body
    fn error_detail(body: &str, fallback: &str) -> String {
        serde_json::from_str::<AuthErrorResponse>(body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn obtain_tokens(&self, request: &TokenObtainRequest) -> Result<TokenPairResponse> {
        let url = self.config.endpoint_url("/authentication/token/");
        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MonetaError::authentication(Self::error_detail(
                &body,
                "Invalid username or password",
            )));
        }
        if !status.is_success() {
            return Err(MonetaError::api(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|_| MonetaError::invalid_response(status.as_u16(), "Malformed token response"))
    }

    async fn refresh_access(&self, request: &TokenRefreshRequest) -> Result<TokenRefreshResponse> {
        let url = self.config.endpoint_url("/authentication/token/refresh/");
        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MonetaError::session_expired(Self::error_detail(
                &body,
                "Refresh token invalid or expired",
            )));
        }
        if !status.is_success() {
            return Err(MonetaError::api(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|_| {
            MonetaError::invalid_response(status.as_u16(), "Malformed refresh response")
        })
    }
}

/// Owner of one user's session state
pub struct SessionManager<P: IdentityProvider> {
    provider: P,
    store: AuthRecordStore,
    config: ClientConfig,
    username: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    access_expires_at: Option<DateTime<Utc>>,
    /// Persistence expiry of the durable record, carried so a refresh rewrite
    /// does not extend the record's own lifetime
    record_expires_at: Option<DateTime<Utc>>,
}

impl<P: IdentityProvider> SessionManager<P> {
    pub fn new(provider: P, store: AuthRecordStore, config: ClientConfig) -> Self {
        Self {
            provider,
            store,
            config,
            username: None,
            access_token: None,
            refresh_token: None,
            access_expires_at: None,
            record_expires_at: None,
        }
    }

    /// True iff a complete token pair is held in memory
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Authenticate with the identity provider and persist the session
    ///
    /// On failure the session stays logged out; no partial state is kept.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let request = TokenObtainRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        request
            .validate()
            .map_err(|e| MonetaError::invalid_input(e.to_string()))?;

        let tokens = match self.provider.obtain_tokens(&request).await {
            Ok(tokens) => tokens,
            Err(e) => {
                self.clear_memory();
                return Err(e);
            }
        };

        self.username = Some(username.to_string());
        self.access_token = Some(tokens.access);
        self.refresh_token = Some(tokens.refresh);
        self.access_expires_at =
            Some(Utc::now() + Duration::minutes(self.config.access_token_minutes));
        self.record_expires_at =
            Some(Utc::now() + Duration::days(self.config.persisted_record_days));

        // A login that cannot be persisted did not happen; no partial state
        if let Err(e) = self.persist_record() {
            self.clear_memory();
            return Err(e);
        }
        info!(username = %username, "Login successful");
        Ok(())
    }

    /// Discard the session locally
    ///
    /// Tokens are not revoked server-side; they are simply dropped. Calling
    /// this while already logged out is a no-op.
    pub fn logout(&mut self) {
        self.clear_memory();
        if let Err(e) = self.store.delete() {
            warn!(error = %e, "Failed to delete auth record during logout");
        }
        info!("Logged out");
    }

    /// Adopt a previously persisted session, if a live record exists
    ///
    /// No identity-provider call is made; token validity is confirmed lazily
    /// on the first subsequent API call. Returns whether a session was
    /// restored.
    pub fn restore_session_if_available(&mut self) -> Result<bool> {
        if self.is_authenticated() {
            return Ok(true);
        }

        let record = match self.store.load()? {
            Some(record) => record,
            None => return Ok(false),
        };

        self.username = Some(record.username);
        self.access_token = Some(record.access_token);
        self.refresh_token = Some(record.refresh_token);
        // The original issuance time is gone; assume a short window and let
        // the refresh check correct course on the first call.
        self.access_expires_at = Some(Utc::now() + Duration::minutes(RESTORED_ACCESS_MINUTES));
        self.record_expires_at = Some(record.expires_at);

        debug!(username = ?self.username, "Session restored from persisted record");
        Ok(true)
    }

    /// Current access token, refreshed first if it is within the grace window
    ///
    /// Fails with an authentication error when no session is held, and with a
    /// session-expired error (after full teardown) when the refresh itself is
    /// rejected.
    pub async fn access_token(&mut self) -> Result<String> {
        if !self.is_authenticated() {
            return Err(MonetaError::not_authenticated());
        }

        let due = match self.access_expires_at {
            Some(expires_at) => {
                Utc::now() >= expires_at - Duration::minutes(REFRESH_GRACE_MINUTES)
            }
            None => true,
        };
        if due {
            self.refresh_access_token().await?;
        }

        self.access_token
            .clone()
            .ok_or_else(MonetaError::not_authenticated)
    }

    /// Exchange the held refresh token for a new access token
    ///
    /// Only the access token is replaced; the refresh token is unchanged. A
    /// rejected refresh logs the session out entirely (memory and persisted
    /// record) before surfacing the error.
    pub async fn refresh_access_token(&mut self) -> Result<()> {
        let refresh_token = self
            .refresh_token
            .clone()
            .ok_or_else(MonetaError::not_authenticated)?;

        let request = TokenRefreshRequest {
            refresh: refresh_token,
        };
        match self.provider.refresh_access(&request).await {
            Ok(response) => {
                self.access_token = Some(response.access);
                self.access_expires_at =
                    Some(Utc::now() + Duration::minutes(self.config.access_token_minutes));
                self.persist_record()?;
                debug!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.logout();
                Err(MonetaError::session_expired(
                    "Session expired, please log in again",
                ))
            }
        }
    }

    fn clear_memory(&mut self) {
        self.username = None;
        self.access_token = None;
        self.refresh_token = None;
        self.access_expires_at = None;
        self.record_expires_at = None;
    }

    fn persist_record(&self) -> Result<()> {
        if let (Some(username), Some(access), Some(refresh)) = (
            &self.username,
            &self.access_token,
            &self.refresh_token,
        ) {
            let mut record = PersistedAuthRecord::new(
                username.clone(),
                access.clone(),
                refresh.clone(),
                self.config.persisted_record_days,
            );
            if let Some(expires_at) = self.record_expires_at {
                record.expires_at = expires_at;
            }
            self.store.save(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AuthRecordStoreConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted identity provider for session tests
    struct MockIdentityProvider {
        login_result: Mutex<Option<Result<TokenPairResponse>>>,
        refresh_result: Mutex<Option<Result<TokenRefreshResponse>>>,
        refresh_calls: AtomicUsize,
    }

    impl MockIdentityProvider {
        fn new() -> Self {
            Self {
                login_result: Mutex::new(None),
                refresh_result: Mutex::new(None),
                refresh_calls: AtomicUsize::new(0),
            }
        }

        fn with_login(self, result: Result<TokenPairResponse>) -> Self {
            *self.login_result.lock().unwrap() = Some(result);
            self
        }

        fn with_refresh(self, result: Result<TokenRefreshResponse>) -> Self {
            *self.refresh_result.lock().unwrap() = Some(result);
            self
        }

        fn refresh_calls(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    impl IdentityProvider for &MockIdentityProvider {
        async fn obtain_tokens(&self, _request: &TokenObtainRequest) -> Result<TokenPairResponse> {
            self.login_result
                .lock()
                .unwrap()
                .take()
                .expect("no login result scripted")
        }

        async fn refresh_access(
            &self,
            _request: &TokenRefreshRequest,
        ) -> Result<TokenRefreshResponse> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            self.refresh_result
                .lock()
                .unwrap()
                .take()
                .expect("no refresh result scripted")
        }
    }

    fn store_in(dir: &TempDir) -> AuthRecordStore {
        AuthRecordStore::new(AuthRecordStoreConfig {
            enabled: true,
            storage_path: Some(dir.path().join("auth.rec")),
        })
    }

    fn token_pair() -> TokenPairResponse {
        TokenPairResponse {
            access: "A1".to_string(),
            refresh: "R1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_success_sets_session_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new().with_login(Ok(token_pair()));
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());

        session.login("alice", "correct-pw").await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.username(), Some("alice"));

        let expires_at = session.access_expires_at.unwrap();
        let expected = Utc::now() + Duration::minutes(15);
        assert!((expires_at - expected).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn test_login_failure_leaves_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new()
            .with_login(Err(MonetaError::authentication("Invalid username or password")));
        let store = store_in(&dir);
        let mut session = SessionManager::new(&provider, store, ClientConfig::default());

        let err = session.login("alice", "wrong").await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(!session.is_authenticated());
        // No persisted record was written
        assert!(!dir.path().join("auth.rec").exists());
    }

    #[tokio::test]
    async fn test_login_persist_failure_leaves_no_state() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the storage directory should be makes the
        // record write fail after the provider has already issued tokens
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = AuthRecordStore::new(AuthRecordStoreConfig {
            enabled: true,
            storage_path: Some(blocker.join("auth.rec")),
        });

        let provider = MockIdentityProvider::new().with_login(Ok(token_pair()));
        let mut session = SessionManager::new(&provider, store, ClientConfig::default());

        assert!(session.login("alice", "pw").await.is_err());
        assert!(!session.is_authenticated());
        assert_eq!(session.username(), None);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new().with_login(Ok(token_pair()));
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());

        session.login("alice", "pw").await.unwrap();
        session.logout();
        assert!(!session.is_authenticated());
        session.logout();
        assert!(!session.is_authenticated());
        assert!(!dir.path().join("auth.rec").exists());
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new().with_login(Ok(token_pair()));
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());
        session.login("alice", "pw").await.unwrap();

        // A fresh manager, as after a process restart
        let provider2 = MockIdentityProvider::new();
        let mut restored =
            SessionManager::new(&provider2, store_in(&dir), ClientConfig::default());

        assert!(restored.restore_session_if_available().unwrap());
        assert!(restored.is_authenticated());
        assert_eq!(restored.username(), Some("alice"));

        // Restored expiry is the conservative window, not the login one
        let expires_at = restored.access_expires_at.unwrap();
        let expected = Utc::now() + Duration::minutes(30);
        assert!((expires_at - expected).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn test_restore_without_record_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new();
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());

        assert!(!session.restore_session_if_available().unwrap());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_no_refresh_when_token_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new().with_login(Ok(token_pair()));
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());
        session.login("alice", "pw").await.unwrap();

        let token = session.access_token().await.unwrap();
        assert_eq!(token, "A1");
        assert_eq!(provider.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_when_inside_grace_window() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new()
            .with_login(Ok(token_pair()))
            .with_refresh(Ok(TokenRefreshResponse {
                access: "A2".to_string(),
            }));
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());
        session.login("alice", "pw").await.unwrap();

        // Push the expiry inside the grace window
        session.access_expires_at = Some(Utc::now() + Duration::seconds(30));

        let token = session.access_token().await.unwrap();
        assert_eq!(token, "A2");
        assert_eq!(provider.refresh_calls(), 1);
        // Refresh token survives unchanged
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_session_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new()
            .with_login(Ok(token_pair()))
            .with_refresh(Err(MonetaError::session_expired(
                "Refresh token invalid or expired",
            )));
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());
        session.login("alice", "pw").await.unwrap();

        session.access_expires_at = Some(Utc::now() - Duration::seconds(1));

        let err = session.access_token().await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(!session.is_authenticated());
        assert!(!dir.path().join("auth.rec").exists());
    }

    #[tokio::test]
    async fn test_access_token_without_session_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new();
        let mut session =
            SessionManager::new(&provider, store_in(&dir), ClientConfig::default());

        let err = session.access_token().await.unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(provider.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rewrite_keeps_record_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockIdentityProvider::new()
            .with_login(Ok(token_pair()))
            .with_refresh(Ok(TokenRefreshResponse {
                access: "A2".to_string(),
            }));
        let store = store_in(&dir);
        let mut session = SessionManager::new(&provider, store, ClientConfig::default());
        session.login("alice", "pw").await.unwrap();

        let before = store_in(&dir).load().unwrap().unwrap().expires_at;
        session.refresh_access_token().await.unwrap();
        let after = store_in(&dir).load().unwrap().unwrap();

        assert_eq!(after.access_token, "A2");
        assert_eq!(after.expires_at, before);
    }
}
