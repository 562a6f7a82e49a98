//! FaceLock Vault - HTTP Service Client
//!
//! `reqwest` implementation of the verification service, vault writer
//! and path picker seams against the vault service's REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::capture::FaceSample;
use crate::client::VerificationService;
use crate::config::ClientConfig;
use crate::creation::{VaultWriter, CREATION_FALLBACK_MESSAGE};
use crate::error::{VaultError, VaultResult};
use crate::guard::InFlight;
use crate::payload::{DecryptedFile, FileContent};
use crate::picker::PathPicker;
use crate::vault::{CreationRequest, VaultLocator};

/// Message used when the service rejects a face without saying why
const VERIFY_FALLBACK_MESSAGE: &str = "Verification failed.";

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct UnlockResponse {
    success: bool,
    #[serde(default)]
    files: Vec<WireFile>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    filename: String,
    #[serde(rename = "type")]
    media_type: String,
    /// Base64 plaintext; empty when `url` is set
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: Option<String>,
}

impl WireFile {
    fn into_decrypted(self) -> VaultResult<DecryptedFile> {
        let content = match self.url.filter(|u| !u.trim().is_empty()) {
            Some(url) => FileContent::External(url),
            None => FileContent::Embedded(STANDARD.decode(self.content.as_bytes()).map_err(|e| {
                VaultError::MalformedResponse(format!("{}: bad base64 content: {}", self.filename, e))
            })?),
        };

        Ok(DecryptedFile::new(self.filename, self.media_type, content))
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrowseResponse {
    #[serde(default)]
    path: Option<String>,
}

/// `{"detail": ...}` or `{"error": ...}`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        let detail = self.detail.map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        detail
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP VAULT SERVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// REST client for the vault service
pub struct HttpVaultService {
    base_url: String,
    client: Client,
    browsing: InFlight,
}

impl HttpVaultService {
    /// Create a client for `config.endpoint`
    pub fn new(config: &ClientConfig) -> VaultResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(format!("facelock-vault/{}", crate::VERSION))
            .build()
            .map_err(|e| VaultError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            client,
            browsing: InFlight::new("folder selection"),
        })
    }

    /// Create a client for a bare base URL with default settings
    pub fn with_base_url(base_url: &str) -> VaultResult<Self> {
        Self::new(&ClientConfig {
            endpoint: base_url.to_string(),
            ..Default::default()
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read an error body, falling back to `None` when there is none
    async fn error_message(response: Response) -> Option<String> {
        let text = response.text().await.ok()?;
        serde_json::from_str::<ErrorBody>(&text)
            .unwrap_or_default()
            .message()
    }

    /// Only an explicit 401/403 is a face rejection; any other status is
    /// a transport failure and follows the configured policy
    fn unlock_error(status: StatusCode, message: Option<String>) -> VaultError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => VaultError::VerificationRejected(
                message.unwrap_or_else(|| VERIFY_FALLBACK_MESSAGE.to_string()),
            ),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => VaultError::Timeout,
            _ => VaultError::ServiceError {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| status.to_string()),
            },
        }
    }

    /// Move the capture into an upload part without copying the buffer
    fn face_part(sample: FaceSample) -> VaultResult<Part> {
        let file_name = sample.file_name();
        let mime = sample.mime_type().to_string();
        Part::bytes(sample.into_bytes())
            .file_name(file_name)
            .mime_str(&mime)
            .map_err(VaultError::from)
    }

    fn image_part(bytes: Vec<u8>, stem: &str) -> VaultResult<Part> {
        let (mime, ext) = match image::guess_format(&bytes) {
            Ok(format) => (
                format.to_mime_type(),
                format.extensions_str().first().copied().unwrap_or("img"),
            ),
            Err(_) => ("application/octet-stream", "bin"),
        };

        Part::bytes(bytes)
            .file_name(format!("{}.{}", stem, ext))
            .mime_str(mime)
            .map_err(VaultError::from)
    }
}

#[async_trait]
impl VerificationService for HttpVaultService {
    async fn verify(&self, sample: FaceSample, locator: &VaultLocator) -> VaultResult<Vec<DecryptedFile>> {
        let face = Self::face_part(sample)?;

        let form = Form::new()
            .text("source_dir", locator.to_string())
            .part("face_image", face);

        let response = self
            .client
            .post(self.url("/vault/unlock"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(Self::unlock_error(status, message));
        }

        let text = response.text().await?;
        let body: UnlockResponse = serde_json::from_str(&text)?;
        if !body.success {
            return Err(VaultError::VerificationRejected(
                body.message.unwrap_or_else(|| VERIFY_FALLBACK_MESSAGE.to_string()),
            ));
        }

        body.files.into_iter().map(WireFile::into_decrypted).collect()
    }

    async fn destroy(&self, locator: &VaultLocator) -> VaultResult<()> {
        let form = Form::new().text("source_dir", locator.to_string());

        let response = self
            .client
            .post(self.url("/vault/destroy"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| status.to_string());
            Err(VaultError::ServiceError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl VaultWriter for HttpVaultService {
    async fn create(&self, request: CreationRequest<'_>) -> VaultResult<String> {
        let mut form = Form::new()
            .text("target_dir", request.target.to_string())
            .part("reference_image", Self::image_part(request.reference_face.to_vec(), "reference")?);

        if let Some(text) = request.secret_text {
            form = form.text("secret_text", text.to_string());
        }
        for file in request.secret_files {
            form = form.part(
                "files",
                Part::bytes(file.content.clone()).file_name(file.filename.clone()),
            );
        }

        let response = self
            .client
            .post(self.url("/vault/create"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| CREATION_FALLBACK_MESSAGE.to_string());
            return Err(VaultError::CreationRejected(message));
        }

        let text = response.text().await?;
        let body: CreateResponse = serde_json::from_str(&text)?;
        Ok(body
            .message
            .unwrap_or_else(|| format!("Vault created at {}", request.target)))
    }
}

#[async_trait]
impl PathPicker for HttpVaultService {
    async fn pick(&self) -> VaultResult<Option<String>> {
        let _token = self.browsing.acquire()?;

        let response = self.client.post(self.url("/system/browse")).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| status.to_string());
            return Err(VaultError::ServiceError {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let body: BrowseResponse = serde_json::from_str(&text)?;
        Ok(body.path.filter(|p| !p.trim().is_empty()))
    }
}
