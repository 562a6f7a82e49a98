//! FaceLock Vault - Path Picker
//!
//! The only way a vault location enters the client. Other code paths
//! never build a `VaultLocator` from free text.

use async_trait::async_trait;

use crate::error::VaultResult;
use crate::vault::VaultLocator;

/// Resolves a user-chosen directory/device to a location string.
///
/// `Ok(None)` (or an empty string) means the user cancelled.
#[async_trait]
pub trait PathPicker: Send + Sync {
    async fn pick(&self) -> VaultResult<Option<String>>;
}

/// Picker with a location chosen up front (e.g. on the command line)
#[derive(Debug, Clone)]
pub struct FixedPicker {
    path: String,
}

impl FixedPicker {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PathPicker for FixedPicker {
    async fn pick(&self) -> VaultResult<Option<String>> {
        Ok(Some(self.path.clone()))
    }
}

impl VaultLocator {
    /// Ask `picker` for a location. Cancelled or blank selections yield `None`.
    pub async fn pick(picker: &dyn PathPicker) -> VaultResult<Option<VaultLocator>> {
        let selected = picker.pick().await?;
        let locator = selected.and_then(VaultLocator::from_selection);

        match &locator {
            Some(loc) => log::debug!("Vault location selected: {}", loc),
            None => log::debug!("Vault location selection cancelled"),
        }

        Ok(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_picker() {
        let locator = VaultLocator::pick(&FixedPicker::new(" /media/usb1 ")).await.unwrap();
        assert_eq!(locator.unwrap().as_str(), "/media/usb1");
    }

    #[tokio::test]
    async fn test_blank_selection_is_cancel() {
        let locator = VaultLocator::pick(&FixedPicker::new("   ")).await.unwrap();
        assert!(locator.is_none());
    }
}
