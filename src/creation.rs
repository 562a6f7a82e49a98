//! FaceLock Vault - Vault Creation (sender flow)
//!
//! Validates a secret bundle locally, then submits it to the vault
//! writer as one request. Nothing leaves the client until validation
//! passes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{VaultError, VaultResult};
use crate::guard::InFlight;
use crate::vault::{CreationOutcome, CreationRequest, SecretBundle};

/// Message shown when the writer fails without saying why
pub const CREATION_FALLBACK_MESSAGE: &str = "vault creation failed";

/// Remote service that encrypts and persists a new vault, all or nothing
#[async_trait]
pub trait VaultWriter: Send + Sync {
    /// Create the vault and return the service's confirmation message
    async fn create(&self, request: CreationRequest<'_>) -> VaultResult<String>;
}

#[async_trait]
impl<T: VaultWriter + ?Sized> VaultWriter for Arc<T> {
    async fn create(&self, request: CreationRequest<'_>) -> VaultResult<String> {
        (**self).create(request).await
    }
}

/// Sender-side creation flow
pub struct VaultCreationFlow<W> {
    writer: W,
    in_flight: InFlight,
}

impl<W: VaultWriter> VaultCreationFlow<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            in_flight: InFlight::new("vault creation"),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Check if a creation request is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Validate and submit `bundle`
    pub async fn create_vault(&self, bundle: &SecretBundle) -> CreationOutcome {
        let request = match bundle.validate() {
            Ok(request) => request,
            Err(e) => {
                log::debug!("Vault creation refused locally: {}", e);
                return CreationOutcome::failed(e.to_string());
            }
        };

        let _token = match self.in_flight.acquire() {
            Ok(token) => token,
            Err(e) => return CreationOutcome::failed(e.to_string()),
        };

        log::info!(
            "Creating vault at {} ({} file(s), text: {})",
            request.target,
            request.secret_files.len(),
            request.secret_text.is_some()
        );

        match self.writer.create(request).await {
            Ok(message) => {
                log::info!("Vault created at {}", request.target);
                CreationOutcome::succeeded(message)
            }
            Err(e) => {
                log::error!("Vault creation at {} failed: {}", request.target, e);
                CreationOutcome::failed(Self::failure_message(&e))
            }
        }
    }

    fn failure_message(err: &VaultError) -> String {
        match err {
            VaultError::CreationRejected(msg) if !msg.trim().is_empty() => msg.clone(),
            VaultError::CreationRejected(_) => CREATION_FALLBACK_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{locator, SecretFile};
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingWriter {
        submitted: Mutex<Vec<(String, Option<String>, usize)>>,
        reject_with: Option<String>,
    }

    #[async_trait]
    impl VaultWriter for RecordingWriter {
        async fn create(&self, request: CreationRequest<'_>) -> VaultResult<String> {
            self.submitted.lock().push((
                request.target.to_string(),
                request.secret_text.map(str::to_string),
                request.secret_files.len(),
            ));
            tokio::time::sleep(Duration::from_millis(20)).await;

            match &self.reject_with {
                Some(msg) => Err(VaultError::CreationRejected(msg.clone())),
                None => Ok(format!("Vault created at {}/SecureVault", request.target)),
            }
        }
    }

    fn full_bundle() -> SecretBundle {
        SecretBundle::new()
            .with_reference_face(vec![1, 2, 3])
            .with_target(locator("/media/usb1"))
            .with_text("meet at dawn")
            .with_file(SecretFile::new("map.png", vec![7; 10]))
    }

    #[tokio::test]
    async fn test_validation_messages() {
        let flow = VaultCreationFlow::new(RecordingWriter::default());

        let no_face = SecretBundle::new()
            .with_target(locator("/media/usb1"))
            .with_text("meet at dawn");
        assert_eq!(
            flow.create_vault(&no_face).await,
            CreationOutcome::failed("face image required")
        );

        let no_target = SecretBundle::new().with_reference_face(vec![1]).with_text("x");
        assert_eq!(
            flow.create_vault(&no_target).await,
            CreationOutcome::failed("target directory required")
        );

        let no_content = SecretBundle::new()
            .with_reference_face(vec![1])
            .with_target(locator("/media/usb1"));
        assert_eq!(
            flow.create_vault(&no_content).await,
            CreationOutcome::failed("add a message or files")
        );

        assert!(flow.writer().submitted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_single_submission() {
        let flow = VaultCreationFlow::new(RecordingWriter::default());

        let outcome = flow.create_vault(&full_bundle()).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "Vault created at /media/usb1/SecureVault");

        let submitted = flow.writer().submitted.lock();
        assert_eq!(
            *submitted,
            vec![("/media/usb1".to_string(), Some("meet at dawn".to_string()), 1)]
        );
    }

    #[tokio::test]
    async fn test_rejection_surfaced_verbatim() {
        let flow = VaultCreationFlow::new(RecordingWriter {
            reject_with: Some("Vault already exists in this directory.".into()),
            ..Default::default()
        });
        assert_eq!(
            flow.create_vault(&full_bundle()).await,
            CreationOutcome::failed("Vault already exists in this directory.")
        );

        let flow = VaultCreationFlow::new(RecordingWriter {
            reject_with: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(
            flow.create_vault(&full_bundle()).await,
            CreationOutcome::failed(CREATION_FALLBACK_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_double_submit_blocked() {
        let flow = VaultCreationFlow::new(RecordingWriter::default());
        let bundle = full_bundle();

        let (first, second) = tokio::join!(flow.create_vault(&bundle), flow.create_vault(&bundle));

        assert!(first.success);
        assert_eq!(second, CreationOutcome::failed("vault creation already in progress"));
        assert_eq!(flow.writer().submitted.lock().len(), 1);
        assert!(!flow.is_busy());
    }
}
