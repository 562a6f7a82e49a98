//! FaceLock Vault - Verification Payloads
//!
//! Decrypted files returned by the verification service and the
//! outcome of a single verification attempt.

use serde::Serialize;

use crate::error::{ErrorCategory, TransportPolicy, VaultError};

/// Kind of a decrypted file, derived from its declared media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeKind {
    Text,
    Image,
    Video,
    Other,
}

impl MimeKind {
    /// Derive the kind from a declared media type such as `video/mp4`.
    ///
    /// Only the top-level type is consulted. File names never are.
    pub fn from_media_type(media_type: &str) -> Self {
        let top = media_type
            .split(['/', ';'])
            .next()
            .unwrap_or_default()
            .trim();

        if top.eq_ignore_ascii_case("text") {
            MimeKind::Text
        } else if top.eq_ignore_ascii_case("image") {
            MimeKind::Image
        } else if top.eq_ignore_ascii_case("video") {
            MimeKind::Video
        } else {
            MimeKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeKind::Text => "text",
            MimeKind::Image => "image",
            MimeKind::Video => "video",
            MimeKind::Other => "other",
        }
    }
}

/// Where the plaintext of a decrypted file lives
#[derive(Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Bytes shipped inline with the response
    Embedded(Vec<u8>),
    /// Reference (stream URL) served by the verification service
    External(String),
}

impl std::fmt::Debug for FileContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileContent::Embedded(bytes) => write!(f, "Embedded({} bytes)", bytes.len()),
            FileContent::External(url) => write!(f, "External({})", url),
        }
    }
}

/// One decrypted item of a vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    /// Original file name (display only)
    pub filename: String,
    /// Media type as declared by the service
    pub media_type: String,
    /// Kind derived from `media_type`
    pub mime_kind: MimeKind,
    /// Plaintext content
    pub content: FileContent,
}

impl DecryptedFile {
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, content: FileContent) -> Self {
        let media_type = media_type.into();
        Self {
            filename: filename.into(),
            mime_kind: MimeKind::from_media_type(&media_type),
            media_type,
            content,
        }
    }
}

/// Why a verification attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Local precondition (no locator, no sample); nothing was sent
    Precondition,
    /// Another verification was already in flight; nothing was sent
    Busy,
    /// The service rejected the face
    Rejected,
    /// The service could not be reached or answered garbage
    Transport,
}

impl FailureCause {
    /// Whether this failure consumes one of the remaining attempts
    pub fn counts_toward_lockout(self, policy: TransportPolicy) -> bool {
        match self {
            FailureCause::Precondition | FailureCause::Busy => false,
            FailureCause::Rejected => true,
            FailureCause::Transport => policy == TransportPolicy::CountAsFailure,
        }
    }
}

/// Result of exactly one verification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Authenticated { payloads: Vec<DecryptedFile> },
    Failed { reason: String, cause: FailureCause },
}

impl VerificationOutcome {
    /// Classify an error raised while verifying
    pub fn from_error(err: &VaultError) -> Self {
        let cause = match err {
            VaultError::Busy(_) => FailureCause::Busy,
            _ => match err.category() {
                ErrorCategory::Precondition => FailureCause::Precondition,
                ErrorCategory::Verification => FailureCause::Rejected,
                _ => FailureCause::Transport,
            },
        };

        VerificationOutcome::Failed {
            reason: err.to_string(),
            cause,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, VerificationOutcome::Authenticated { .. })
    }
}
