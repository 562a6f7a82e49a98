//! FaceLock Vault - Face Capture
//!
//! Still-image face samples and the camera seam that produces them.
//! A sample lives for exactly one attempt: it is moved into the
//! verification request, and a sample that is dropped unsent is wiped.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A single still capture of the receiver's face
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct FaceSample {
    /// Encoded image bytes (JPEG/PNG/...)
    bytes: Vec<u8>,
    /// Media type of `bytes`
    mime_type: String,
}

impl FaceSample {
    /// Wrap already-encoded image bytes. Returns `None` for an empty capture.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Some(Self {
            bytes,
            mime_type: mime_type.into(),
        })
    }

    /// Wrap encoded image bytes, detecting the media type from the data.
    ///
    /// Returns `None` when the bytes are not a recognizable image.
    pub fn from_image_bytes(bytes: Vec<u8>) -> Option<Self> {
        let format = image::guess_format(&bytes).ok()?;
        let mime = format.to_mime_type().to_string();
        Self::new(bytes, mime)
    }

    /// Encoded image bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand the encoded bytes over to the request body. Nothing is copied;
    /// the emptied sample is still wiped when dropped.
    pub fn into_bytes(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Media type of the encoded image
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Upload file name matching the media type
    pub fn file_name(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "capture.png",
            "image/webp" => "capture.webp",
            _ => "capture.jpg",
        }
    }

    /// Short SHA-256 fingerprint for log correlation. The sample itself is
    /// never logged.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        hex::encode(&digest[..8])
    }
}

impl std::fmt::Debug for FaceSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceSample")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Camera seam. Each call produces a fresh sample or `None` when the
/// device produced nothing (unavailable, permission denied, blank frame).
pub trait FaceCapture: Send {
    fn capture(&mut self) -> Option<FaceSample>;
}

/// Capture stand-in that reads a still image from disk on every call
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FaceCapture for FileCapture {
    fn capture(&mut self) -> Option<FaceSample> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let sample = FaceSample::from_image_bytes(bytes);
                if sample.is_none() {
                    log::warn!("Capture source is not an image: {}", self.path.display());
                }
                sample
            }
            Err(e) => {
                log::warn!("Capture source unavailable ({}): {}", self.path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}
