//! FaceLock Vault - Verification Client
//!
//! Submits one face sample per attempt to the verification service and
//! turns whatever comes back into a `VerificationOutcome`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::capture::FaceSample;
use crate::error::{VaultError, VaultResult};
use crate::guard::InFlight;
use crate::payload::{DecryptedFile, VerificationOutcome};
use crate::vault::VaultLocator;

/// Remote biometric matcher and decryptor
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Match `sample` against the vault at `locator` and return its
    /// decrypted contents on success.
    ///
    /// Rejections are `VaultError::VerificationRejected`; anything else
    /// is treated as a transport failure.
    async fn verify(&self, sample: FaceSample, locator: &VaultLocator) -> VaultResult<Vec<DecryptedFile>>;

    /// Ask the service to securely erase the vault at `locator`
    async fn destroy(&self, locator: &VaultLocator) -> VaultResult<()>;
}

#[async_trait]
impl<T: VerificationService + ?Sized> VerificationService for Arc<T> {
    async fn verify(&self, sample: FaceSample, locator: &VaultLocator) -> VaultResult<Vec<DecryptedFile>> {
        (**self).verify(sample, locator).await
    }

    async fn destroy(&self, locator: &VaultLocator) -> VaultResult<()> {
        (**self).destroy(locator).await
    }
}

/// Verification client with a single in-flight slot
pub struct VerificationClient<S> {
    service: S,
    in_flight: InFlight,
}

impl<S: VerificationService> VerificationClient<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            in_flight: InFlight::new("verification"),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Check if a verification is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Run one verification attempt.
    ///
    /// A missing locator or sample fails locally and nothing is sent.
    /// While a request is outstanding further calls fail with
    /// `FailureCause::Busy`. Neither of these consume an attempt.
    pub async fn verify(
        &self,
        sample: Option<FaceSample>,
        locator: Option<&VaultLocator>,
    ) -> VerificationOutcome {
        match self.try_verify(sample, locator).await {
            Ok(payloads) => VerificationOutcome::Authenticated { payloads },
            Err(e) => VerificationOutcome::from_error(&e),
        }
    }

    async fn try_verify(
        &self,
        sample: Option<FaceSample>,
        locator: Option<&VaultLocator>,
    ) -> VaultResult<Vec<DecryptedFile>> {
        let locator = locator.ok_or(VaultError::MissingLocator)?;
        let sample = sample.ok_or(VaultError::MissingSample)?;
        let _token = self.in_flight.acquire()?;

        let attempt = Uuid::new_v4();
        log::info!(
            "[{}] Verifying against {} (sample {} bytes, fp {})",
            attempt,
            locator,
            sample.bytes().len(),
            sample.fingerprint()
        );

        match self.service.verify(sample, locator).await {
            Ok(payloads) => {
                log::info!("[{}] Authenticated, {} item(s) released", attempt, payloads.len());
                Ok(payloads)
            }
            Err(e) if e.is_transport() => {
                log::error!("[{}] Transport failure: {}", attempt, e);
                Err(e)
            }
            Err(e) => {
                log::warn!("[{}] Verification failed: {}", attempt, e);
                Err(e)
            }
        }
    }

    /// Deliver a destruction directive to the service
    pub async fn destroy(&self, locator: &VaultLocator) -> VaultResult<()> {
        self.service.destroy(locator).await
    }
}
