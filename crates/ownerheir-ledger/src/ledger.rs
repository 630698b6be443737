//! The succession ledger state machine.
//!
//! ```text
//!            deposit (anyone)            withdraw (owner, resets clock)
//!          ┌──────────────┐            ┌──────────────┐
//!          ▼              │            ▼              │
//!   (owner, heir, balance, last_activity) ────────────┘
//!          │
//!          │ take_possession (heir, now - last_activity >= 30 days)
//!          ▼
//!   (new_owner, heir, balance, last_activity)
//! ```
//!
//! Every operation validates first and mutates last, so a rejected call
//! leaves the ledger exactly as it was.

use crate::events::LedgerEvent;
use ownerheir_core::{Amount, Principal, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Owner inactivity required before the heir may take possession.
pub const COOLDOWN_PERIOD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Role a caller must hold for a restricted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Heir,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Heir => write!(f, "heir"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unauthorized: {caller} is not the {required}")]
    Unauthorized { caller: Principal, required: Role },

    #[error("Insufficient funds: requested {requested}, balance {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Cooldown not elapsed: possession available at {available_at} ({} seconds remaining)", .remaining.as_secs())]
    CooldownNotElapsed {
        available_at: Timestamp,
        remaining: Duration,
    },

    #[error("Balance overflow")]
    BalanceOverflow,
}

/// Custodied balance with an owner, a fixed heir and an inactivity clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessionLedger {
    owner: Principal,
    heir: Principal,
    balance: Amount,
    last_activity: Timestamp,
}

impl SuccessionLedger {
    /// Create a ledger owned by `creator` with `heir` as the fallback controller.
    pub fn new(creator: Principal, heir: Principal, now: Timestamp) -> Self {
        log::info!("Ledger created: owner={} heir={} at {}", creator, heir, now);
        Self {
            owner: creator,
            heir,
            balance: Amount::ZERO,
            last_activity: now,
        }
    }

    pub fn owner(&self) -> Principal {
        self.owner
    }

    pub fn heir(&self) -> Principal {
        self.heir
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Time of the most recent owner withdrawal (or creation)
    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// Earliest time at which the heir may take possession
    pub fn possession_available_at(&self) -> Timestamp {
        self.last_activity.saturating_add(COOLDOWN_PERIOD)
    }

    /// Time left before the heir may act. Zero once the cooldown has elapsed.
    pub fn cooldown_remaining(&self, now: Timestamp) -> Duration {
        COOLDOWN_PERIOD.saturating_sub(now.elapsed_since(self.last_activity))
    }

    pub fn cooldown_elapsed(&self, now: Timestamp) -> bool {
        now.elapsed_since(self.last_activity) >= COOLDOWN_PERIOD
    }

    /// Accept incoming value from anyone.
    pub fn deposit(&mut self, from: Principal, amount: Amount) -> Result<LedgerEvent, LedgerError> {
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        self.balance = balance;

        log::info!("Deposit of {} from {} (balance {})", amount, from, balance);
        Ok(LedgerEvent::Deposited {
            from,
            amount,
            balance,
        })
    }

    /// Owner withdrawal. Also the heartbeat: the clock resets even for zero.
    ///
    /// The returned [`LedgerEvent::Withdrawn`] names the recipient and amount
    /// the host must pay out.
    pub fn withdraw(
        &mut self,
        caller: &Principal,
        amount: Amount,
        now: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        self.require(caller, Role::Owner)?;

        let balance = self.balance.checked_sub(amount).ok_or_else(|| {
            log::warn!(
                "Withdrawal of {} rejected: balance is {}",
                amount,
                self.balance
            );
            LedgerError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            }
        })?;

        self.balance = balance;
        self.last_activity = now;

        if amount.is_zero() {
            log::info!("Heartbeat from owner {} at {}", self.owner, now);
        } else {
            log::info!(
                "Owner {} withdrew {} at {} (balance {})",
                self.owner,
                amount,
                now,
                balance
            );
        }

        Ok(LedgerEvent::Withdrawn {
            owner: self.owner,
            amount,
            balance,
            at: now,
        })
    }

    /// Heir succession. `new_owner` need not be the heir.
    ///
    /// The activity clock is left untouched, so the new owner inherits the
    /// elapsed inactivity until their own first withdrawal.
    pub fn take_possession(
        &mut self,
        caller: &Principal,
        new_owner: Principal,
        now: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        self.require(caller, Role::Heir)?;

        if !self.cooldown_elapsed(now) {
            let err = LedgerError::CooldownNotElapsed {
                available_at: self.possession_available_at(),
                remaining: self.cooldown_remaining(now),
            };
            log::warn!("Take possession rejected: {}", err);
            return Err(err);
        }

        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        log::info!(
            "Heir {} took possession at {}: owner {} -> {}",
            self.heir,
            now,
            previous_owner,
            new_owner
        );

        Ok(LedgerEvent::PossessionTaken {
            heir: self.heir,
            previous_owner,
            new_owner,
            at: now,
        })
    }

    fn require(&self, caller: &Principal, role: Role) -> Result<(), LedgerError> {
        let holder = match role {
            Role::Owner => &self.owner,
            Role::Heir => &self.heir,
        };
        if caller != holder {
            log::warn!("Rejected call from {}: {} required", caller, role);
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                required: role,
            });
        }
        Ok(())
    }
}
