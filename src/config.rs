//! FaceLock Vault - Client Configuration
//!
//! Loaded from a JSON file; every field has a default so the client
//! works without any file at all.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TransportPolicy, VaultError, VaultResult};
use crate::lockout::{LockoutConfig, LOCKOUT_THRESHOLD};

/// Environment variable overriding `endpoint`
pub const ENDPOINT_ENV: &str = "FACELOCK_ENDPOINT";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the vault service API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Consecutive failures before the vault is destroyed
    #[serde(default = "default_lockout_threshold")]
    pub lockout_threshold: u32,

    /// Whether transport failures consume attempts
    #[serde(default)]
    pub transport_policy: TransportPolicy,

    /// Longest image side shown without a downscaled preview
    #[serde(default = "default_max_preview_dimension")]
    pub max_preview_dimension: Option<u32>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_endpoint() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_lockout_threshold() -> u32 {
    LOCKOUT_THRESHOLD
}

fn default_max_preview_dimension() -> Option<u32> {
    Some(1024)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            lockout_threshold: default_lockout_threshold(),
            transport_policy: TransportPolicy::default(),
            max_preview_dimension: default_max_preview_dimension(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents).map_err(|e| {
                VaultError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply `FACELOCK_ENDPOINT` if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim().to_string();
            }
        }
        self
    }

    pub fn validate(&self) -> VaultResult<()> {
        if self.lockout_threshold == 0 {
            return Err(VaultError::Config("lockout_threshold must be at least 1".into()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(VaultError::Config("endpoint must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(VaultError::Config("request_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Lockout settings for a receiver session
    pub fn lockout(&self) -> LockoutConfig {
        LockoutConfig {
            threshold: self.lockout_threshold,
            transport_policy: self.transport_policy,
        }
    }
}
