//! Persisted auth record storage
//!
//! A session survives process restarts through one durable record: a base64
//! encoding of a JSON document written under a single well-known path. The
//! record carries its own persistence expiry, independent of (and longer
//! than) the access token's lifetime. Reading is destructive on bad input: a
//! stale or corrupt record is deleted, never handed back to the session.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::TokenStorageConfig;
use crate::error::{MonetaError, Result};

/// Durable snapshot of an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedAuthRecord {
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Persistence expiry of the record itself, not the access token's
    pub expires_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

impl PersistedAuthRecord {
    pub fn new(
        username: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        lifetime_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: now + Duration::days(lifetime_days),
            saved_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Auth record storage configuration
#[derive(Debug, Clone, Default)]
pub struct AuthRecordStoreConfig {
    pub enabled: bool,
    pub storage_path: Option<PathBuf>,
}

impl From<TokenStorageConfig> for AuthRecordStoreConfig {
    fn from(config: TokenStorageConfig) -> Self {
        Self {
            enabled: config.enabled,
            storage_path: config.storage_path.map(PathBuf::from),
        }
    }
}

/// Auth record storage manager
///
/// Read, write, and delete are the only operations; the session lifecycle
/// manager is the sole caller.
#[derive(Debug)]
pub struct AuthRecordStore {
    config: AuthRecordStoreConfig,
}

impl AuthRecordStore {
    pub fn new(config: AuthRecordStoreConfig) -> Self {
        Self { config }
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.config.storage_path.as_deref()
    }

    fn get_storage_path(&self) -> Result<PathBuf> {
        self.config
            .storage_path
            .clone()
            .ok_or_else(|| MonetaError::invalid_input("Auth record storage path not configured"))
    }

    /// Write the record, replacing any previous one
    pub fn save(&self, record: &PersistedAuthRecord) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let path = self.get_storage_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MonetaError::io_from_error("Failed to create storage directory", e))?;
        }

        let json = serde_json::to_string_pretty(record)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);

        fs::write(&path, encoded)
            .map_err(|e| MonetaError::io_from_error("Failed to write auth record", e))?;
        debug!(path = %path.display(), "Auth record saved");
        Ok(())
    }

    /// Read the record, if one exists and is still within its own expiry
    ///
    /// A record past its persistence expiry, or one that fails to decode, is
    /// deleted on the spot and `None` is returned.
    pub fn load(&self) -> Result<Option<PersistedAuthRecord>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let path = self.get_storage_path()?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| MonetaError::io_from_error("Failed to read auth record", e))?;
        if content.trim().is_empty() {
            self.delete()?;
            return Ok(None);
        }

        let record = match self.decode(content.trim()) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Auth record is corrupt, deleting");
                self.delete()?;
                return Ok(None);
            }
        };

        if record.is_expired(Utc::now()) {
            debug!(expired_at = %record.expires_at, "Auth record expired, deleting");
            self.delete()?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Delete the record; succeeds whether or not one exists
    pub fn delete(&self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let path = self.get_storage_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| MonetaError::io_from_error("Failed to delete auth record", e))?;
        }
        Ok(())
    }

    fn decode(&self, content: &str) -> Result<PersistedAuthRecord> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(content)
            .map_err(|e| MonetaError::serialization(format!("Invalid record encoding: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| MonetaError::serialization(format!("Invalid record encoding: {}", e)))?;
        Ok(serde_json::from_str(&json)?)
    }
}
