//! FaceLock Vault - Vault Types
//!
//! Vault locations and the sender-side secret bundle.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{VaultError, VaultResult};

/// Opaque location of a vault (directory or device path).
///
/// Built only from a path picker selection, never from free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VaultLocator(String);

impl VaultLocator {
    /// Accept a picker selection. Blank selections are rejected.
    pub(crate) fn from_selection(selection: String) -> Option<Self> {
        let trimmed = selection.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A secret file to seal into the vault
#[derive(Clone, PartialEq, Eq)]
pub struct SecretFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl SecretFile {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn from_path<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self { filename, content })
    }
}

impl fmt::Debug for SecretFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretFile")
            .field("filename", &self.filename)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Everything the sender submits to create a vault
#[derive(Debug, Clone, Default)]
pub struct SecretBundle {
    /// Enrolled reference face (encoded image)
    pub reference_face: Option<Vec<u8>>,
    /// Where the vault is written
    pub target: Option<VaultLocator>,
    /// Optional secret message
    pub secret_text: Option<String>,
    /// Secret files
    pub secret_files: Vec<SecretFile>,
}

/// Validated view of a bundle, as handed to the vault writer
#[derive(Debug, Clone, Copy)]
pub struct CreationRequest<'a> {
    pub target: &'a VaultLocator,
    pub reference_face: &'a [u8],
    pub secret_text: Option<&'a str>,
    pub secret_files: &'a [SecretFile],
}

impl SecretBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_face(mut self, image: Vec<u8>) -> Self {
        self.reference_face = Some(image);
        self
    }

    pub fn with_target(mut self, target: VaultLocator) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.secret_text = Some(text.into());
        self
    }

    pub fn with_file(mut self, file: SecretFile) -> Self {
        self.secret_files.push(file);
        self
    }

    /// Secret text, unless absent or blank
    fn text(&self) -> Option<&str> {
        self.secret_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    /// Check the bundle in submission order, stopping at the first gap:
    /// reference face, then target, then content.
    pub fn validate(&self) -> VaultResult<CreationRequest<'_>> {
        let reference_face = self
            .reference_face
            .as_deref()
            .filter(|face| !face.is_empty())
            .ok_or(VaultError::MissingReferenceFace)?;

        let target = self.target.as_ref().ok_or(VaultError::MissingTarget)?;

        let secret_text = self.text();
        if secret_text.is_none() && self.secret_files.is_empty() {
            return Err(VaultError::EmptyBundle);
        }

        Ok(CreationRequest {
            target,
            reference_face,
            secret_text,
            secret_files: &self.secret_files,
        })
    }
}

/// What the sender sees after a creation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreationOutcome {
    pub success: bool,
    pub message: String,
}

impl CreationOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
pub(crate) fn locator(path: &str) -> VaultLocator {
    VaultLocator::from_selection(path.to_string()).unwrap()
}
