//! FaceLock Vault - Payload Renderer
//!
//! Turns decrypted files into display instructions. Decrypted bytes are
//! attacker-influenced: they are decoded as data (UTF-8 text, image
//! pixels) or passed through opaquely, and never evaluated. The branch
//! taken depends only on the declared kind; file names are labels.

use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use serde::Serialize;
use thiserror::Error;

use crate::payload::{DecryptedFile, FileContent, MimeKind};

/// Why one item cannot be displayed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("text is not valid UTF-8: {0}")]
    InvalidText(String),

    #[error("unsupported or corrupt image: {0}")]
    InvalidImage(String),

    #[error("{0} payloads must be embedded, not referenced")]
    UnsupportedSource(&'static str),

    #[error("empty {0} payload")]
    Empty(&'static str),
}

/// Where a video plays from
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum VideoSource {
    /// Stream served by the verification service
    Stream { url: String },
    /// Inline bytes
    Embedded {
        media_type: String,
        #[serde(skip)]
        data: Vec<u8>,
    },
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoSource::Stream { url } => write!(f, "Stream({})", url),
            VideoSource::Embedded { media_type, data } => {
                write!(f, "Embedded({}, {} bytes)", media_type, data.len())
            }
        }
    }
}

/// Advisory playback controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackControls {
    pub play_pause: bool,
    pub seek: bool,
}

impl Default for PlaybackControls {
    fn default() -> Self {
        Self {
            play_pause: true,
            seek: true,
        }
    }
}

/// What to put on screen for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderInstruction {
    /// Show verbatim in a monospaced, read-only block
    Text { body: String },
    /// Show inline; `preview` is a downscaled JPEG when the original is large
    Image {
        media_type: String,
        width: u32,
        height: u32,
        #[serde(skip)]
        data: Vec<u8>,
        #[serde(skip)]
        preview: Option<Vec<u8>>,
    },
    /// Play with the given controls
    Video {
        source: VideoSource,
        controls: PlaybackControls,
    },
    /// Inert attachment; offered for saving, never opened
    Opaque { media_type: String, size: Option<usize> },
}

/// Render result for one item of a payload set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedItem {
    pub filename: String,
    pub kind: MimeKind,
    pub result: Result<RenderInstruction, RenderError>,
}

/// Payload renderer
#[derive(Debug, Clone)]
pub struct PayloadRenderer {
    /// Images with a longer side than this also get a preview
    max_preview_dimension: Option<u32>,
}

impl PayloadRenderer {
    pub fn new(max_preview_dimension: Option<u32>) -> Self {
        Self {
            max_preview_dimension,
        }
    }

    /// Build the display instruction for one decrypted file
    pub fn present(&self, file: &DecryptedFile) -> Result<RenderInstruction, RenderError> {
        match file.mime_kind {
            MimeKind::Text => Self::present_text(&file.content),
            MimeKind::Image => self.present_image(&file.content),
            MimeKind::Video => Self::present_video(&file.media_type, &file.content),
            MimeKind::Other => Ok(RenderInstruction::Opaque {
                media_type: file.media_type.clone(),
                size: match &file.content {
                    FileContent::Embedded(bytes) => Some(bytes.len()),
                    FileContent::External(_) => None,
                },
            }),
        }
    }

    /// Render a whole payload set. A failing item never stops the others.
    pub fn present_all(&self, files: &[DecryptedFile]) -> Vec<RenderedItem> {
        files
            .iter()
            .map(|file| {
                let result = self.present(file);
                if let Err(e) = &result {
                    log::warn!("Cannot render {}: {}", file.filename, e);
                }
                RenderedItem {
                    filename: file.filename.clone(),
                    kind: file.mime_kind,
                    result,
                }
            })
            .collect()
    }

    fn present_text(content: &FileContent) -> Result<RenderInstruction, RenderError> {
        let bytes = match content {
            FileContent::Embedded(bytes) => bytes,
            FileContent::External(_) => return Err(RenderError::UnsupportedSource("text")),
        };

        let body = std::str::from_utf8(bytes)
            .map_err(|e| RenderError::InvalidText(e.to_string()))?
            .to_string();

        Ok(RenderInstruction::Text { body })
    }

    fn present_image(&self, content: &FileContent) -> Result<RenderInstruction, RenderError> {
        let bytes = match content {
            FileContent::Embedded(bytes) => bytes,
            FileContent::External(_) => return Err(RenderError::UnsupportedSource("image")),
        };
        if bytes.is_empty() {
            return Err(RenderError::Empty("image"));
        }

        let format = image::guess_format(bytes).map_err(|e| RenderError::InvalidImage(e.to_string()))?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| RenderError::InvalidImage(e.to_string()))?;
        let (width, height) = img.dimensions();

        let preview = match self.max_preview_dimension {
            Some(max) if width.max(height) > max => Self::preview(&img, max),
            _ => None,
        };

        Ok(RenderInstruction::Image {
            media_type: format.to_mime_type().to_string(),
            width,
            height,
            data: bytes.clone(),
            preview,
        })
    }

    /// Downscale to fit `max_dimension`, keeping the aspect ratio
    fn preview(img: &DynamicImage, max_dimension: u32) -> Option<Vec<u8>> {
        let (width, height) = img.dimensions();

        let (new_width, new_height) = if width > height {
            let ratio = max_dimension as f32 / width as f32;
            (max_dimension, ((height as f32 * ratio) as u32).max(1))
        } else {
            let ratio = max_dimension as f32 / height as f32;
            (((width as f32 * ratio) as u32).max(1), max_dimension)
        };

        let resized = img.resize_exact(new_width, new_height, FilterType::Lanczos3);
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut output = Vec::new();
        match rgb.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Jpeg) {
            Ok(()) => Some(output),
            Err(e) => {
                log::warn!("Preview generation failed: {}", e);
                None
            }
        }
    }

    fn present_video(media_type: &str, content: &FileContent) -> Result<RenderInstruction, RenderError> {
        let source = match content {
            FileContent::External(url) if !url.trim().is_empty() => VideoSource::Stream { url: url.clone() },
            FileContent::Embedded(bytes) if !bytes.is_empty() => VideoSource::Embedded {
                media_type: media_type.to_string(),
                data: bytes.clone(),
            },
            _ => return Err(RenderError::Empty("video")),
        };

        Ok(RenderInstruction::Video {
            source,
            controls: PlaybackControls::default(),
        })
    }
}

impl Default for PayloadRenderer {
    fn default() -> Self {
        Self::new(Some(1024))
    }
}
