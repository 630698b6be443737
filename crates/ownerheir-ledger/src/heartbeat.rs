//! Deadman heartbeat evaluation for a succession ledger.
//!
//! Pure logic, no I/O. Takes the ledger and the current time and returns a
//! recommendation. The caller (CLI, daemon) decides whether to act on it.
//!
//! The owner resets the cooldown by withdrawing, zero included. This module
//! reports how much of the cooldown has elapsed:
//!
//! ```text
//! |--- Healthy ---|--- CheckinRecommended ---|--- CheckinRequired ---|--- Expired
//! 0%             50%                        90%                    100%
//! ```
//!
//! `Expired` means the heir may take possession right now.

use crate::ledger::{SuccessionLedger, COOLDOWN_PERIOD};
use ownerheir_core::{Principal, Timestamp};
use serde::{Deserialize, Serialize};

/// When to recommend a check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Fraction of the cooldown elapsed before recommending a check-in (0.0–1.0).
    /// Default: 0.5.
    #[serde(default = "default_checkin_threshold")]
    pub checkin_threshold: f64,

    /// Fraction of the cooldown elapsed before a check-in is critical (0.0–1.0).
    /// Default: 0.9.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

fn default_checkin_threshold() -> f64 {
    0.5
}

fn default_critical_threshold() -> f64 {
    0.9
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            checkin_threshold: default_checkin_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

impl HeartbeatConfig {
    /// Validate that thresholds are sensible.
    pub fn validate(&self) -> Result<(), HeartbeatError> {
        if !(self.checkin_threshold > 0.0 && self.checkin_threshold < 1.0) {
            return Err(HeartbeatError::InvalidThreshold(
                "checkin_threshold must be between 0.0 and 1.0 exclusive".into(),
            ));
        }
        if !(self.critical_threshold > self.checkin_threshold && self.critical_threshold < 1.0) {
            return Err(HeartbeatError::InvalidThreshold(
                "critical_threshold must be between checkin_threshold and 1.0 exclusive".into(),
            ));
        }
        Ok(())
    }
}

/// What the heartbeat recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartbeatAction {
    /// Cooldown far from elapsed. No action needed.
    Healthy,
    /// Passed the check-in threshold. Owner should withdraw (even zero) soon.
    CheckinRecommended,
    /// Passed the critical threshold. Owner must check in now.
    CheckinRequired,
    /// Cooldown elapsed. The heir may take possession.
    Expired,
}

/// Full heartbeat status for a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatStatus {
    pub owner: Principal,
    pub heir: Principal,
    pub last_activity: Timestamp,
    /// Seconds since the last owner activity
    pub elapsed_secs: u64,
    /// Seconds until the heir may act (0 once expired)
    pub remaining_secs: u64,
    /// Fraction of the cooldown elapsed (0.0–1.0+)
    pub elapsed_fraction: f64,
    pub possession_available_at: Timestamp,
    pub action: HeartbeatAction,
}

impl HeartbeatStatus {
    /// Approximate days until the heir may act
    pub fn days_remaining(&self) -> f64 {
        self.remaining_secs as f64 / 86_400.0
    }
}

/// Errors from heartbeat evaluation.
#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// Evaluate the heartbeat status of a ledger at `now`.
pub fn evaluate_heartbeat(
    ledger: &SuccessionLedger,
    now: Timestamp,
    config: &HeartbeatConfig,
) -> HeartbeatStatus {
    let elapsed = now.elapsed_since(ledger.last_activity());
    let elapsed_fraction = elapsed.as_secs_f64() / COOLDOWN_PERIOD.as_secs_f64();

    // Same predicate as take_possession, not the float
    let action = if ledger.cooldown_elapsed(now) {
        HeartbeatAction::Expired
    } else if elapsed_fraction >= config.critical_threshold {
        HeartbeatAction::CheckinRequired
    } else if elapsed_fraction >= config.checkin_threshold {
        HeartbeatAction::CheckinRecommended
    } else {
        HeartbeatAction::Healthy
    };

    HeartbeatStatus {
        owner: ledger.owner(),
        heir: ledger.heir(),
        last_activity: ledger.last_activity(),
        elapsed_secs: elapsed.as_secs(),
        remaining_secs: ledger.cooldown_remaining(now).as_secs(),
        elapsed_fraction,
        possession_available_at: ledger.possession_available_at(),
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ownerheir_core::principal::PRINCIPAL_LEN;
    use ownerheir_core::Amount;

    const DAY: u64 = 86_400;

    fn principal(n: u8) -> Principal {
        Principal::from_bytes([n; PRINCIPAL_LEN]).unwrap()
    }

    fn ledger_at(last_activity: u64) -> SuccessionLedger {
        SuccessionLedger::new(
            principal(1),
            principal(2),
            Timestamp::from_unix_secs(last_activity),
        )
    }

    fn at(secs: u64) -> Timestamp {
        Timestamp::from_unix_secs(secs)
    }

    #[test]
    fn test_healthy_status() {
        let status = evaluate_heartbeat(&ledger_at(0), at(3 * DAY), &HeartbeatConfig::default());
        assert_eq!(status.action, HeartbeatAction::Healthy);
        assert!((status.elapsed_fraction - 0.1).abs() < 0.001);
        assert_eq!(status.remaining_secs, 27 * DAY);
        assert_eq!(status.possession_available_at, at(30 * DAY));
    }

    #[test]
    fn test_checkin_recommended() {
        let status = evaluate_heartbeat(&ledger_at(0), at(18 * DAY), &HeartbeatConfig::default());
        assert_eq!(status.action, HeartbeatAction::CheckinRecommended);
        assert!((status.elapsed_fraction - 0.6).abs() < 0.001);
    }

    #[test]
    fn test_checkin_required() {
        let status = evaluate_heartbeat(&ledger_at(0), at(29 * DAY), &HeartbeatConfig::default());
        assert_eq!(status.action, HeartbeatAction::CheckinRequired);
        assert!((status.days_remaining() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_expired_matches_cooldown_gate() {
        let config = HeartbeatConfig::default();
        let status = evaluate_heartbeat(&ledger_at(0), at(30 * DAY - 1), &config);
        assert_eq!(status.action, HeartbeatAction::CheckinRequired);
        assert_eq!(status.remaining_secs, 1);

        let status = evaluate_heartbeat(&ledger_at(0), at(30 * DAY), &config);
        assert_eq!(status.action, HeartbeatAction::Expired);
        assert_eq!(status.remaining_secs, 0);
    }

    #[test]
    fn test_exactly_at_checkin_threshold() {
        let status = evaluate_heartbeat(&ledger_at(0), at(15 * DAY), &HeartbeatConfig::default());
        assert_eq!(status.action, HeartbeatAction::CheckinRecommended);
    }

    #[test]
    fn test_heartbeat_resets_status() {
        let config = HeartbeatConfig::default();
        let mut ledger = ledger_at(0);
        assert_eq!(
            evaluate_heartbeat(&ledger, at(29 * DAY), &config).action,
            HeartbeatAction::CheckinRequired
        );

        ledger
            .withdraw(&principal(1), Amount::ZERO, at(29 * DAY))
            .unwrap();
        let status = evaluate_heartbeat(&ledger, at(29 * DAY), &config);
        assert_eq!(status.action, HeartbeatAction::Healthy);
        assert_eq!(status.elapsed_secs, 0);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = HeartbeatConfig {
            checkin_threshold: 0.3,
            critical_threshold: 0.7,
        };
        let status = evaluate_heartbeat(&ledger_at(0), at(10 * DAY), &config);
        assert_eq!(status.action, HeartbeatAction::CheckinRecommended);
        let status = evaluate_heartbeat(&ledger_at(0), at(22 * DAY), &config);
        assert_eq!(status.action, HeartbeatAction::CheckinRequired);
    }

    #[test]
    fn test_config_validation() {
        let bad = HeartbeatConfig {
            checkin_threshold: 0.0,
            critical_threshold: 0.9,
        };
        assert!(bad.validate().is_err());

        let bad = HeartbeatConfig {
            checkin_threshold: 0.5,
            critical_threshold: 0.4,
        };
        assert!(bad.validate().is_err());

        let bad = HeartbeatConfig {
            checkin_threshold: 0.5,
            critical_threshold: 1.0,
        };
        assert!(bad.validate().is_err());

        let bad = HeartbeatConfig {
            checkin_threshold: f64::NAN,
            critical_threshold: 0.9,
        };
        assert!(bad.validate().is_err());

        assert!(HeartbeatConfig::default().validate().is_ok());
    }
}
