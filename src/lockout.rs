//! FaceLock Vault - Lockout Controller
//!
//! Attempt accounting for one receiver session. Consecutive failed
//! verifications are counted; reaching the threshold destroys the vault
//! and ends the session for good.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TransportPolicy, VaultError, VaultResult};
use crate::payload::VerificationOutcome;
use crate::vault::VaultLocator;

/// Consecutive failures that destroy a vault. The verification service
/// enforces the same number on its side.
pub const LOCKOUT_THRESHOLD: u32 = 3;

/// Lockout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Failures before destruction
    pub threshold: u32,
    /// Whether transport failures consume attempts
    pub transport_policy: TransportPolicy,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            threshold: LOCKOUT_THRESHOLD,
            transport_policy: TransportPolicy::CountAsFailure,
        }
    }
}

/// Attempt state of one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttemptState {
    /// Failures since session start or the last successful verification
    pub failure_count: u32,
    /// Set once, never cleared within a session
    pub destroyed: bool,
}

impl AttemptState {
    /// Attempts left before destruction
    pub fn remaining(&self, threshold: u32) -> u32 {
        if self.destroyed {
            0
        } else {
            threshold.saturating_sub(self.failure_count)
        }
    }
}

/// Request for the service to securely erase a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestructionDirective {
    pub locator: VaultLocator,
    pub failures: u32,
    pub issued_at: DateTime<Utc>,
}

/// Result of recording one outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// State after the outcome was applied
    pub state: AttemptState,
    /// Present exactly once: on the outcome that reached the threshold
    pub directive: Option<DestructionDirective>,
}

/// Owns the attempt counter and the destroyed flag of a session
#[derive(Debug)]
pub struct LockoutController {
    config: LockoutConfig,
    state: AttemptState,
    destroyed_at: Option<DateTime<Utc>>,
}

impl LockoutController {
    pub fn new(config: LockoutConfig) -> Self {
        Self {
            config,
            state: AttemptState::default(),
            destroyed_at: None,
        }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// When the destruction threshold was reached
    pub fn destroyed_at(&self) -> Option<DateTime<Utc>> {
        self.destroyed_at
    }

    /// Attempts left before destruction
    pub fn remaining_attempts(&self) -> u32 {
        self.state.remaining(self.config.threshold)
    }

    /// Apply the outcome of one attempt against `locator`.
    ///
    /// Outcomes must be recorded in the order the attempts were issued.
    /// Once destroyed, every call is rejected with `VaultDestroyed` and
    /// the state is left as is.
    pub fn record(
        &mut self,
        outcome: &VerificationOutcome,
        locator: &VaultLocator,
    ) -> VaultResult<Recorded> {
        if self.state.destroyed {
            return Err(VaultError::VaultDestroyed);
        }

        let directive = match outcome {
            VerificationOutcome::Authenticated { .. } => {
                self.state.failure_count = 0;
                None
            }
            VerificationOutcome::Failed { cause, .. }
                if !cause.counts_toward_lockout(self.config.transport_policy) =>
            {
                log::debug!("Attempt not counted ({:?})", cause);
                None
            }
            VerificationOutcome::Failed { .. } => {
                self.state.failure_count += 1;

                if self.state.failure_count >= self.config.threshold {
                    let now = Utc::now();
                    self.state.destroyed = true;
                    self.destroyed_at = Some(now);
                    Some(DestructionDirective {
                        locator: locator.clone(),
                        failures: self.state.failure_count,
                        issued_at: now,
                    })
                } else {
                    None
                }
            }
        };

        Ok(Recorded {
            state: self.state,
            directive,
        })
    }

    /// Full reinitialization of the session
    pub fn reset(&mut self) {
        self.state = AttemptState::default();
        self.destroyed_at = None;
    }
}

impl Default for LockoutController {
    fn default() -> Self {
        Self::new(LockoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::FailureCause;
    use crate::vault::locator;

    fn failed(cause: FailureCause) -> VerificationOutcome {
        VerificationOutcome::Failed {
            reason: "Face mismatch.".into(),
            cause,
        }
    }

    fn authenticated() -> VerificationOutcome {
        VerificationOutcome::Authenticated { payloads: Vec::new() }
    }

    #[test]
    fn test_destroy_on_third_failure() {
        let usb = locator("/media/usb1");
        let mut lockout = LockoutController::default();

        let first = lockout.record(&failed(FailureCause::Rejected), &usb).unwrap();
        assert_eq!(first.state, AttemptState { failure_count: 1, destroyed: false });
        assert!(first.directive.is_none());
        assert_eq!(lockout.remaining_attempts(), 2);

        lockout.record(&failed(FailureCause::Rejected), &usb).unwrap();
        let third = lockout.record(&failed(FailureCause::Rejected), &usb).unwrap();

        assert_eq!(third.state, AttemptState { failure_count: 3, destroyed: true });
        let directive = third.directive.unwrap();
        assert_eq!(directive.locator, usb);
        assert_eq!(directive.failures, 3);
        assert!(lockout.destroyed_at().is_some());
        assert_eq!(lockout.remaining_attempts(), 0);

        // A fourth record is rejected and changes nothing
        assert!(matches!(
            lockout.record(&failed(FailureCause::Rejected), &usb),
            Err(VaultError::VaultDestroyed)
        ));
        assert!(matches!(
            lockout.record(&authenticated(), &usb),
            Err(VaultError::VaultDestroyed)
        ));
        assert_eq!(lockout.state(), AttemptState { failure_count: 3, destroyed: true });
    }

    #[test]
    fn test_success_resets_count() {
        let usb = locator("/media/usb1");
        let mut lockout = LockoutController::default();

        lockout.record(&failed(FailureCause::Rejected), &usb).unwrap();
        lockout.record(&failed(FailureCause::Rejected), &usb).unwrap();
        let recorded = lockout.record(&authenticated(), &usb).unwrap();
        assert_eq!(recorded.state, AttemptState { failure_count: 0, destroyed: false });

        let next = lockout.record(&failed(FailureCause::Rejected), &usb).unwrap();
        assert_eq!(next.state.failure_count, 1);
    }

    #[test]
    fn test_precondition_and_busy_not_counted() {
        let usb = locator("/media/usb1");
        let mut lockout = LockoutController::default();

        for cause in [FailureCause::Precondition, FailureCause::Busy] {
            let recorded = lockout.record(&failed(cause), &usb).unwrap();
            assert_eq!(recorded.state, AttemptState::default());
        }
    }

    #[test]
    fn test_transport_policy() {
        let usb = locator("/media/usb1");

        let mut counting = LockoutController::default();
        let recorded = counting.record(&failed(FailureCause::Transport), &usb).unwrap();
        assert_eq!(recorded.state.failure_count, 1);

        let mut exempt = LockoutController::new(LockoutConfig {
            transport_policy: TransportPolicy::Exempt,
            ..Default::default()
        });
        for _ in 0..5 {
            exempt.record(&failed(FailureCause::Transport), &usb).unwrap();
        }
        assert_eq!(exempt.state(), AttemptState::default());
    }

    #[test]
    fn test_count_matches_failures_since_success() {
        let usb = locator("/media/usb1");
        let mut lockout = LockoutController::default();
        let script = [false, true, false, false, true, false, true, false, false];

        let mut expected = 0;
        for ok in script {
            let outcome = if ok { authenticated() } else { failed(FailureCause::Rejected) };
            let recorded = lockout.record(&outcome, &usb).unwrap();
            expected = if ok { 0 } else { expected + 1 };
            assert_eq!(recorded.state.failure_count, expected);
            assert!(recorded.state.failure_count < LOCKOUT_THRESHOLD);
            assert!(!recorded.state.destroyed);
        }
    }

    #[test]
    fn test_reset() {
        let usb = locator("/media/usb1");
        let mut lockout = LockoutController::new(LockoutConfig {
            threshold: 1,
            ..Default::default()
        });

        let recorded = lockout.record(&failed(FailureCause::Rejected), &usb).unwrap();
        assert!(recorded.state.destroyed);

        lockout.reset();
        assert_eq!(lockout.state(), AttemptState::default());
        assert!(lockout.destroyed_at().is_none());
    }
}
