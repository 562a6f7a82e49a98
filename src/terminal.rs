//! FaceLock Vault - Vault Access Terminal (receiver flow)
//!
//! Drives one receiver session: capture → verify → render or count the
//! failure. The terminal shows exactly one screen at a time:
//!
//! ```text
//! Idle ──capture──► Verifying ──ok──► Authenticated (final)
//!                     │   ▲
//!              fail n<max │ capture
//!                     ▼   │
//!                   Failed(n) ──fail n==max──► Destroyed (final)
//! ```
//!
//! Only `reset` leaves a final screen, and it rebuilds the whole session.
//! An attempt still outstanding at reset is discarded when it returns.

use parking_lot::Mutex;
use serde::Serialize;

use crate::capture::FaceCapture;
use crate::client::{VerificationClient, VerificationService};
use crate::config::ClientConfig;
use crate::error::{VaultError, VaultResult};
use crate::lockout::{AttemptState, LockoutConfig, LockoutController};
use crate::payload::{FailureCause, VerificationOutcome};
use crate::picker::PathPicker;
use crate::render::{PayloadRenderer, RenderedItem};
use crate::vault::VaultLocator;

/// What the terminal currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Idle,
    Verifying,
    Authenticated { items: Vec<RenderedItem> },
    Failed { failures: u32, remaining: u32, reason: String },
    Destroyed { reason: String },
}

/// Screen name, for status lines and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Idle,
    Verifying,
    Authenticated,
    Failed,
    Destroyed,
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Idle => ScreenKind::Idle,
            Screen::Verifying => ScreenKind::Verifying,
            Screen::Authenticated { .. } => ScreenKind::Authenticated,
            Screen::Failed { .. } => ScreenKind::Failed,
            Screen::Destroyed { .. } => ScreenKind::Destroyed,
        }
    }

    /// No further attempts are accepted from this screen
    pub fn is_final(&self) -> bool {
        matches!(self, Screen::Authenticated { .. } | Screen::Destroyed { .. })
    }
}

/// Per-session state; replaced wholesale on reset
#[derive(Debug)]
struct Session {
    /// Bumped on every reset so late outcomes can be recognized
    generation: u64,
    locator: Option<VaultLocator>,
    lockout: LockoutController,
    screen: Screen,
    notice: Option<String>,
}

impl Session {
    fn new(config: LockoutConfig, generation: u64) -> Self {
        Self {
            generation,
            locator: None,
            lockout: LockoutController::new(config),
            screen: Screen::Idle,
            notice: None,
        }
    }

    /// Refuse anything but a fresh attempt on a non-final screen
    fn ensure_open(&self) -> VaultResult<()> {
        match self.screen {
            Screen::Destroyed { .. } => Err(VaultError::VaultDestroyed),
            Screen::Authenticated { .. } => Err(VaultError::AlreadyAuthenticated),
            Screen::Verifying => Err(VaultError::Busy("verification")),
            Screen::Idle | Screen::Failed { .. } => Ok(()),
        }
    }
}

/// Receiver-side access terminal
pub struct VaultAccessTerminal<S> {
    client: VerificationClient<S>,
    renderer: PayloadRenderer,
    lockout_config: LockoutConfig,
    session: Mutex<Session>,
}

impl<S: VerificationService> VaultAccessTerminal<S> {
    pub fn new(service: S, config: &ClientConfig) -> Self {
        Self::with_parts(
            service,
            config.lockout(),
            PayloadRenderer::new(config.max_preview_dimension),
        )
    }

    pub fn with_parts(service: S, lockout: LockoutConfig, renderer: PayloadRenderer) -> Self {
        Self {
            client: VerificationClient::new(service),
            renderer,
            lockout_config: lockout,
            session: Mutex::new(Session::new(lockout, 0)),
        }
    }

    pub fn client(&self) -> &VerificationClient<S> {
        &self.client
    }

    /// Current screen
    pub fn screen(&self) -> Screen {
        self.session.lock().screen.clone()
    }

    /// Current attempt accounting
    pub fn attempt_state(&self) -> AttemptState {
        self.session.lock().lockout.state()
    }

    /// Last status message that did not change the screen
    pub fn notice(&self) -> Option<String> {
        self.session.lock().notice.clone()
    }

    /// Selected vault location
    pub fn locator(&self) -> Option<VaultLocator> {
        self.session.lock().locator.clone()
    }

    /// Choose the vault to open through `picker`.
    ///
    /// A cancelled selection keeps the previous location.
    pub async fn select_locator(&self, picker: &dyn PathPicker) -> VaultResult<Option<VaultLocator>> {
        self.session.lock().ensure_open()?;

        let picked = VaultLocator::pick(picker).await?;

        let mut session = self.session.lock();
        session.ensure_open()?;
        if let Some(locator) = &picked {
            session.locator = Some(locator.clone());
            session.notice = None;
        }
        Ok(session.locator.clone())
    }

    /// Capture a face and try to open the selected vault.
    ///
    /// Missing location or capture is reported through `notice` and
    /// changes nothing else. Refused outright once the session is final.
    pub async fn unlock(&self, camera: &mut dyn FaceCapture) -> VaultResult<Screen> {
        let (generation, locator, sample, previous) = {
            let mut session = self.session.lock();
            session.ensure_open()?;
            session.notice = None;

            let locator = session.locator.clone();
            let sample = match locator {
                Some(_) => camera.capture(),
                None => None,
            };

            let previous = session.screen.clone();
            if sample.is_some() && locator.is_some() {
                session.screen = Screen::Verifying;
            }
            (session.generation, locator, sample, previous)
        };

        let outcome = self.client.verify(sample, locator.as_ref()).await;

        let directive = {
            let mut session = self.session.lock();

            if session.generation != generation {
                log::warn!(
                    "Discarding verification outcome from a session that was reset (authenticated: {})",
                    outcome.is_authenticated()
                );
                return Ok(session.screen.clone());
            }

            let locator = match (&outcome, locator) {
                (
                    VerificationOutcome::Failed {
                        cause: FailureCause::Precondition | FailureCause::Busy,
                        reason,
                    },
                    _,
                )
                | (VerificationOutcome::Failed { reason, .. }, None) => {
                    session.screen = previous;
                    session.notice = Some(reason.clone());
                    return Ok(session.screen.clone());
                }
                (_, Some(locator)) => locator,
                (VerificationOutcome::Authenticated { .. }, None) => {
                    session.screen = previous;
                    return Err(VaultError::MissingLocator);
                }
            };

            let recorded = session.lockout.record(&outcome, &locator)?;
            let threshold = session.lockout.config().threshold;

            session.screen = match outcome {
                VerificationOutcome::Authenticated { payloads } => Screen::Authenticated {
                    items: self.renderer.present_all(&payloads),
                },
                VerificationOutcome::Failed { reason, .. } if recorded.state.destroyed => {
                    log::warn!(
                        "Vault at {} destroyed after {} failed attempts",
                        locator,
                        recorded.state.failure_count
                    );
                    Screen::Destroyed { reason }
                }
                VerificationOutcome::Failed { reason, cause }
                    if cause.counts_toward_lockout(self.lockout_config.transport_policy) =>
                {
                    Screen::Failed {
                        failures: recorded.state.failure_count,
                        remaining: recorded.state.remaining(threshold),
                        reason,
                    }
                }
                VerificationOutcome::Failed { reason, .. } => {
                    session.notice = Some(reason);
                    previous
                }
            };

            recorded.directive
        };

        if let Some(directive) = directive {
            match self.client.destroy(&directive.locator).await {
                Ok(()) => log::warn!(
                    "Destruction directive delivered for {} ({} failures, issued {})",
                    directive.locator,
                    directive.failures,
                    directive.issued_at
                ),
                Err(e) => log::error!(
                    "Destruction directive for {} not delivered: {}",
                    directive.locator,
                    e
                ),
            }
        }

        Ok(self.screen())
    }

    /// Throw the session away and start over
    pub fn reset(&self) {
        let mut session = self.session.lock();
        if session.screen == Screen::Verifying {
            log::warn!("Reset while a verification is outstanding");
        }
        let generation = session.generation.wrapping_add(1);
        *session = Session::new(self.lockout_config, generation);
        log::info!("Terminal session reset");
    }
}
