//! Unified error handling for the Moneta CLI and SDK
//!
//! One error enum covers the whole crate, with:
//! - Unique error codes for debugging and support
//! - Structured error information with context
//! - Convenient constructor methods
//! - Automatic conversions from common error types

use std::fmt;
use thiserror::Error;

/// Unified Result type for all Moneta operations
pub type Result<T> = std::result::Result<T, MonetaError>;

/// Error codes for Moneta operations
///
/// Each error has a unique code in the format `MXXX` where:
/// - M1XX: Authentication and authorization errors
/// - M2XX: Network and API errors
/// - M3XX: File and I/O errors
/// - M4XX: Configuration errors
/// - M5XX: Validation and input errors
/// - M9XX: Internal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (M1XX)
    /// M101: Authentication failed
    AuthenticationFailed,
    /// M102: Permission denied
    PermissionDenied,
    /// M103: Session expired
    SessionExpired,
    /// M104: Not authenticated
    NotAuthenticated,

    // Network (M2XX)
    /// M201: HTTP request failed
    HttpError,
    /// M202: Connection timeout
    ConnectionTimeout,
    /// M203: Connection refused
    ConnectionRefused,
    /// M204: API returned error response
    ApiError,
    /// M205: Invalid API response format
    InvalidResponse,
    /// M206: Resource not found
    ResourceNotFound,

    // File/IO (M3XX)
    /// M301: File not found
    FileNotFound,
    /// M302: File read error
    FileReadError,
    /// M303: File write error
    FileWriteError,

    // Configuration (M4XX)
    /// M401: Configuration error
    ConfigError,
    /// M402: Invalid endpoint URL
    InvalidEndpoint,

    // Validation (M5XX)
    /// M501: Invalid input
    InvalidInput,
    /// M502: Server rejected submitted data
    ValidationFailed,

    // Internal (M9XX)
    /// M901: Internal error
    InternalError,
    /// M902: Serialization error
    SerializationError,
    /// M903: Dialog error
    DialogError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::AuthenticationFailed => 101,
            ErrorCode::PermissionDenied => 102,
            ErrorCode::SessionExpired => 103,
            ErrorCode::NotAuthenticated => 104,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 203,
            ErrorCode::ApiError => 204,
            ErrorCode::InvalidResponse => 205,
            ErrorCode::ResourceNotFound => 206,

            ErrorCode::FileNotFound => 301,
            ErrorCode::FileReadError => 302,
            ErrorCode::FileWriteError => 303,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,

            ErrorCode::InternalError => 901,
            ErrorCode::SerializationError => 902,
            ErrorCode::DialogError => 903,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.code())
    }
}

/// Main error type for all Moneta operations
#[derive(Error, Debug)]
pub enum MonetaError {
    /// Credentials rejected, missing session, or refresh token expired
    #[error("[{code}] Authentication failed: {message}")]
    Authentication { code: ErrorCode, message: String },

    /// Authenticated but not authorized (HTTP 403)
    #[error("[{code}] Permission denied: {message}")]
    Permission { code: ErrorCode, message: String },

    /// The server rejected submitted data (HTTP 400)
    #[error("[{code}] Validation error: {message}")]
    Validation {
        code: ErrorCode,
        message: String,
        /// Raw error payload from the server, when it parsed as JSON
        payload: Option<serde_json::Value>,
    },

    /// Referenced resource does not exist (HTTP 404)
    #[error("[{code}] Not found: {resource}")]
    NotFound { code: ErrorCode, resource: String },

    /// Any other non-2xx API response
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    /// Transport-level failure (timeout, DNS, connection refused)
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// File or IO error
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration error
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    /// Invalid input error
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    /// Internal/Unexpected error
    #[error("[{code}] Internal error: {message}")]
    Internal { code: ErrorCode, message: String },

    /// JSON serialization error
    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl MonetaError {
    // --- Authentication ---

    /// Create authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::AuthenticationFailed,
            message: message.into(),
        }
    }

    /// Create not-authenticated error (no live session)
    pub fn not_authenticated() -> Self {
        Self::Authentication {
            code: ErrorCode::NotAuthenticated,
            message: "not authenticated".to_string(),
        }
    }

    /// Create session expired error
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::SessionExpired,
            message: message.into(),
        }
    }

    /// Create permission error
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission {
            code: ErrorCode::PermissionDenied,
            message: message.into(),
        }
    }

    // --- Network ---

    /// Create network error from message
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            code: ErrorCode::HttpError,
            message: message.into(),
            source: None,
        }
    }

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };

        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message: message.into(),
        }
    }

    /// Create invalid response error
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status,
            message: message.into(),
        }
    }

    /// Create validation error from a server payload
    pub fn validation(message: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            payload,
        }
    }

    /// Create not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            code: ErrorCode::ResourceNotFound,
            resource: resource.into(),
        }
    }

    // --- File/IO ---

    /// Create IO error from std::io::Error
    pub fn io_from_error(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::FileWriteError,
            _ => ErrorCode::FileReadError,
        };

        Self::Io {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Configuration ---

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    // --- Validation ---

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- Internal ---

    /// Create internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    /// Create serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: message.into(),
            source: None,
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Permission { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::Internal { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// Check if this is an authentication or authorization error
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Permission { .. })
    }

    /// Check if this is a network-level error
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Api { .. })
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for MonetaError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation", err)
    }
}

impl From<reqwest::Error> for MonetaError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for MonetaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for MonetaError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<dialoguer::Error> for MonetaError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Internal {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", err),
        }
    }
}
