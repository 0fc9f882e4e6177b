//! Authentication API DTOs
//!
//! Types for the token endpoints under `/api/v1/authentication/`. The server
//! issues a short-lived access token and a longer-lived refresh token on
//! login; the refresh endpoint mints a new access token only and leaves the
//! refresh token unchanged.

use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Token DTOs
// ============================================================================

/// Credential login request
///
/// Used for POST /api/v1/authentication/token/
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TokenObtainRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Token pair issued on successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Refresh access token request
///
/// Used for POST /api/v1/authentication/token/refresh/
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TokenRefreshRequest {
    #[validate(length(min = 1))]
    pub refresh: String,
}

/// Refresh response; only a new access token is returned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
}

/// Error body the server sends on 401 responses
///
/// `code` is `token_not_valid` when the bearer token has expired, which the
/// client distinguishes from a plain credential rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthErrorResponse {
    pub detail: Option<String>,
    pub code: Option<String>,
}

// ============================================================================
// Permission DTOs
// ============================================================================

/// User permissions response
///
/// Response for GET /api/v1/authentication/user-permissions/. `permissions`
/// holds entries shaped `<app>.<action>_<model>` (e.g. `finance.add_expense`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissionsResponse {
    pub is_superuser: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}
