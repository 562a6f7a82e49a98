//! # FaceLock Vault
//!
//! Client for face-gated secret vaults with destructive lockout.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      FACELOCK VAULT                     │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │  CAPTURE    │  │  TERMINAL   │  │  CREATION FLOW  │  │
//! │  │  (camera)   │  │  (receiver) │  │  (sender)       │  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────────┘  │
//! │         │                │                │             │
//! │  ┌──────┴──────┐  ┌──────┴──────┐  ┌──────┴──────────┐  │
//! │  │ VERIFICATION│  │  LOCKOUT    │  │  PAYLOAD        │  │
//! │  │ CLIENT      │  │  CONTROLLER │  │  RENDERER       │  │
//! │  └──────┬──────┘  └─────────────┘  └─────────────────┘  │
//! │         │                                               │
//! │  ┌──────┴────────────────────────────────────────────┐  │
//! │  │  VAULT SERVICE (verify / create / browse / wipe)  │  │
//! │  └───────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - Three consecutive failed verifications destroy the vault
//! - Local precondition failures never consume an attempt
//! - One verification in flight at a time per session
//! - Face samples are never logged and never copied; the buffer moves
//!   into the request body on submission
//! - Decrypted payloads are decoded as data, never executed

pub mod capture;
pub mod client;
pub mod config;
pub mod creation;
pub mod error;
pub mod guard;
pub mod http;
pub mod lockout;
pub mod payload;
pub mod picker;
pub mod render;
pub mod terminal;
pub mod vault;

pub use capture::{FaceCapture, FaceSample, FileCapture};
pub use client::{VerificationClient, VerificationService};
pub use config::ClientConfig;
pub use creation::{VaultCreationFlow, VaultWriter};
pub use error::{TransportPolicy, VaultError, VaultResult};
pub use http::HttpVaultService;
pub use lockout::{AttemptState, DestructionDirective, LockoutController, LOCKOUT_THRESHOLD};
pub use payload::{DecryptedFile, FailureCause, FileContent, MimeKind, VerificationOutcome};
pub use picker::{FixedPicker, PathPicker};
pub use render::{PayloadRenderer, RenderError, RenderInstruction, RenderedItem};
pub use terminal::{Screen, VaultAccessTerminal};
pub use vault::{CreationOutcome, SecretBundle, SecretFile, VaultLocator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
