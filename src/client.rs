//! Authenticated HTTP client for the Moneta API
//!
//! Wraps every outbound call with the session lifecycle: fail fast when no
//! session is held, refresh the access token when it is inside the grace
//! window, inject the bearer credential, and translate HTTP statuses into the
//! crate's typed errors. A 401 that signals token expiry triggers exactly one
//! refresh attempt and then still surfaces an error; the call is never
//! replayed transparently, the caller re-invokes.

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use moneta_protocol::AuthErrorResponse;

use crate::config::ClientConfig;
use crate::error::{MonetaError, Result};
use crate::session::{HttpIdentityProvider, SessionManager};
use crate::store::AuthRecordStore;

/// Server-side error code on 401 bodies when the bearer token has expired
const TOKEN_NOT_VALID: &str = "token_not_valid";

/// Shape of a 401 response body
#[derive(Debug, PartialEq, Eq)]
pub enum UnauthorizedKind {
    /// The access token expired; a refresh may recover the session
    ExpiredToken,
    /// Any other credential rejection
    Other,
}

/// Classify a 401 body by its server-provided error code
pub fn classify_unauthorized(body: &str) -> UnauthorizedKind {
    let parsed = serde_json::from_str::<AuthErrorResponse>(body).ok();
    match parsed.and_then(|e| e.code) {
        Some(code) if code == TOKEN_NOT_VALID => UnauthorizedKind::ExpiredToken,
        _ => UnauthorizedKind::Other,
    }
}

/// Translate a non-2xx, non-401 response into a typed error
pub fn map_error_status(status: StatusCode, endpoint: &str, body: &str) -> MonetaError {
    match status.as_u16() {
        400 => {
            let payload = serde_json::from_str::<serde_json::Value>(body).ok();
            let message = payload
                .as_ref()
                .and_then(|v| v.get("detail"))
                .and_then(|d| d.as_str())
                .unwrap_or("The server rejected the submitted data")
                .to_string();
            MonetaError::validation(message, payload)
        }
        403 => {
            let detail = serde_json::from_str::<AuthErrorResponse>(body)
                .ok()
                .and_then(|e| e.detail)
                .unwrap_or_else(|| "Insufficient permissions".to_string());
            MonetaError::permission(detail)
        }
        404 => MonetaError::not_found(endpoint.to_string()),
        _ => MonetaError::api(status.as_u16(), body.to_string()),
    }
}

/// Client-side view of the Moneta API
///
/// The trait is the seam services and tests share; the HTTP implementation
/// below is the real one.
pub trait ApiClient {
    fn is_authenticated(&self) -> bool;

    fn current_username(&self) -> Option<String>;

    fn config(&self) -> &ClientConfig;

    fn login(
        &self,
        username: String,
        password: String,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn logout(&self) -> impl std::future::Future<Output = Result<()>>;

    /// Attempt silent restoration from the persisted auth record
    fn restore_session(&self) -> impl std::future::Future<Output = Result<bool>>;

    /// Issue an authenticated request; `None` means an empty (204) success
    fn authenticated_request<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
    ) -> impl std::future::Future<Output = Result<Option<R>>>
    where
        T: Serialize + Send + Sync + 'static,
        R: DeserializeOwned + Send + 'static;

    /// GET that expects a body
    fn get_json<R>(&self, endpoint: &str) -> impl std::future::Future<Output = Result<R>>
    where
        R: DeserializeOwned + Send + 'static,
    {
        async move {
            self.authenticated_request::<(), R>(Method::GET, endpoint, None)
                .await?
                .ok_or_else(|| {
                    MonetaError::invalid_response(204, format!("Empty response from {endpoint}"))
                })
        }
    }
}

/// HTTP client with session management
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
    session: Mutex<SessionManager<HttpIdentityProvider>>,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        let store = AuthRecordStore::new(config.token_storage.clone().into());
        let provider = HttpIdentityProvider::new(config.clone())?;
        let session = SessionManager::new(provider, store, config.clone());

        Ok(Self {
            client,
            config,
            session: Mutex::new(session),
        })
    }

    /// Unauthenticated reachability probe, used by the status command
    pub async fn ping(&self) -> bool {
        let url = self.config.endpoint_url("/");
        match self.client.get(&url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Server ping failed");
                false
            }
        }
    }

    /// Handle a 401 on an authenticated call
    ///
    /// If the body signals an expired token, one refresh is attempted. A
    /// successful refresh still fails the original call; the caller observes
    /// the error and re-invokes with the new token. A failed refresh has
    /// already torn the session down.
    async fn handle_unauthorized(&self, body: &str) -> MonetaError {
        match classify_unauthorized(body) {
            UnauthorizedKind::ExpiredToken => {
                let refresh = {
                    let mut session = self.session.lock().unwrap();
                    session.refresh_access_token().await
                };
                match refresh {
                    Ok(()) => MonetaError::authentication(
                        "Access token was refreshed, please retry the request",
                    ),
                    Err(e) => e,
                }
            }
            UnauthorizedKind::Other => {
                let detail = serde_json::from_str::<AuthErrorResponse>(body)
                    .ok()
                    .and_then(|e| e.detail)
                    .unwrap_or_else(|| "Authentication failed".to_string());
                MonetaError::authentication(detail)
            }
        }
    }
}

impl ApiClient for HttpClient {
    fn is_authenticated(&self) -> bool {
        self.session.lock().unwrap().is_authenticated()
    }

    fn current_username(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .username()
            .map(|u| u.to_string())
    }

    fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn login(&self, username: String, password: String) -> Result<()> {
        let mut session = self.session.lock().unwrap();
        session.login(&username, &password).await
    }

    async fn logout(&self) -> Result<()> {
        self.session.lock().unwrap().logout();
        Ok(())
    }

    async fn restore_session(&self) -> Result<bool> {
        self.session.lock().unwrap().restore_session_if_available()
    }

    async fn authenticated_request<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
    ) -> Result<Option<R>>
    where
        T: Serialize + Send + Sync + 'static,
        R: DeserializeOwned + Send + 'static,
    {
        // Precondition and grace-window refresh happen before any network IO
        let access_token = {
            let mut session = self.session.lock().unwrap();
            if !session.is_authenticated() {
                return Err(MonetaError::not_authenticated());
            }
            session.access_token().await?
        };

        let url = self.config.endpoint_url(endpoint);
        debug!(method = %method, url = %url, "API request");

        let mut request_builder = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", access_token));

        if let Some(data) = payload {
            request_builder = request_builder.json(data);
        }

        let response = request_builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match status.as_u16() {
            200 | 201 => {
                if body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str(&body).map(Some).map_err(|_| {
                    MonetaError::invalid_response(
                        status.as_u16(),
                        format!("Malformed response body from {endpoint}"),
                    )
                })
            }
            204 => Ok(None),
            401 => Err(self.handle_unauthorized(&body).await),
            _ => Err(map_error_status(status, endpoint, &body)),
        }
    }
}
