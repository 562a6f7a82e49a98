//! FaceLock Vault - Error Types

use thiserror::Error;

use crate::render::RenderError;

/// Result type for vault client operations
pub type VaultResult<T> = Result<T, VaultError>;

/// How transport failures are treated by the lockout counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportPolicy {
    /// Unreachable service, timeouts and malformed replies count like a mismatch
    #[default]
    CountAsFailure,
    /// Transport failures are reported but never consume an attempt
    Exempt,
}

/// Broad error category, used for status display and lockout accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Precondition,
    Verification,
    Transport,
    Render,
    Creation,
    Session,
    Local,
}

/// Vault client error types
#[derive(Error, Debug)]
pub enum VaultError {
    // ═══════════════════════════════════════════════════════════════
    // PRECONDITION ERRORS (never leave the client)
    // ═══════════════════════════════════════════════════════════════

    #[error("select a vault location first")]
    MissingLocator,

    #[error("no face captured - check the camera")]
    MissingSample,

    #[error("face image required")]
    MissingReferenceFace,

    #[error("target directory required")]
    MissingTarget,

    #[error("add a message or files")]
    EmptyBundle,

    #[error("{0} already in progress")]
    Busy(&'static str),

    // ═══════════════════════════════════════════════════════════════
    // VERIFICATION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("{0}")]
    VerificationRejected(String),

    // ═══════════════════════════════════════════════════════════════
    // TRANSPORT ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("verification service unreachable: {0}")]
    ServiceUnreachable(String),

    #[error("verification service timed out")]
    Timeout,

    #[error("malformed service response: {0}")]
    MalformedResponse(String),

    #[error("service error (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    // ═══════════════════════════════════════════════════════════════
    // RENDER ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("cannot display payload: {0}")]
    Render(#[from] RenderError),

    // ═══════════════════════════════════════════════════════════════
    // CREATION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("{0}")]
    CreationRejected(String),

    // ═══════════════════════════════════════════════════════════════
    // SESSION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Vault DESTROYED - no further attempts accepted")]
    VaultDestroyed,

    #[error("vault already unlocked - reset the terminal to start over")]
    AlreadyAuthenticated,

    // ═══════════════════════════════════════════════════════════════
    // LOCAL ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl VaultError {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            VaultError::MissingLocator
            | VaultError::MissingSample
            | VaultError::MissingReferenceFace
            | VaultError::MissingTarget
            | VaultError::EmptyBundle
            | VaultError::Busy(_) => ErrorCategory::Precondition,
            VaultError::VerificationRejected(_) => ErrorCategory::Verification,
            VaultError::ServiceUnreachable(_)
            | VaultError::Timeout
            | VaultError::MalformedResponse(_)
            | VaultError::ServiceError { .. } => ErrorCategory::Transport,
            VaultError::Render(_) => ErrorCategory::Render,
            VaultError::CreationRejected(_) => ErrorCategory::Creation,
            VaultError::VaultDestroyed | VaultError::AlreadyAuthenticated => ErrorCategory::Session,
            VaultError::Config(_) | VaultError::IoError(_) => ErrorCategory::Local,
        }
    }

    /// Check if this is a local precondition failure (nothing was sent)
    pub fn is_precondition(&self) -> bool {
        self.category() == ErrorCategory::Precondition
    }

    /// Check if this is a transport-level failure
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// Check if a verification attempt that ended in this error consumes
    /// one of the vault's remaining attempts
    pub fn counts_toward_lockout(&self, policy: TransportPolicy) -> bool {
        match self.category() {
            ErrorCategory::Verification => true,
            ErrorCategory::Transport => policy == TransportPolicy::CountAsFailure,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::MalformedResponse(e.to_string())
    }
}

impl From<reqwest::Error> for VaultError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VaultError::Timeout
        } else if e.is_decode() {
            VaultError::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            VaultError::ServiceError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            VaultError::ServiceUnreachable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_never_counts() {
        for err in [
            VaultError::MissingLocator,
            VaultError::MissingSample,
            VaultError::Busy("verification"),
        ] {
            assert!(err.is_precondition());
            assert!(!err.counts_toward_lockout(TransportPolicy::CountAsFailure));
            assert!(!err.counts_toward_lockout(TransportPolicy::Exempt));
        }
    }

    #[test]
    fn test_transport_policy() {
        let err = VaultError::Timeout;
        assert!(err.is_transport());
        assert!(err.counts_toward_lockout(TransportPolicy::CountAsFailure));
        assert!(!err.counts_toward_lockout(TransportPolicy::Exempt));
    }

    #[test]
    fn test_rejection_always_counts() {
        let err = VaultError::VerificationRejected("Face mismatch.".into());
        assert!(err.counts_toward_lockout(TransportPolicy::Exempt));
        assert_eq!(err.to_string(), "Face mismatch.");
    }

    #[test]
    fn test_creation_messages() {
        assert_eq!(VaultError::MissingReferenceFace.to_string(), "face image required");
        assert_eq!(VaultError::MissingTarget.to_string(), "target directory required");
        assert_eq!(VaultError::EmptyBundle.to_string(), "add a message or files");
    }
}
