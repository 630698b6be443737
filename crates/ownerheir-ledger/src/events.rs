//! Events emitted by the ledger when its state changes

use ownerheir_core::{Amount, Principal, Timestamp};
use serde::{Deserialize, Serialize};

/// Record of a successful ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// The ledger was constructed
    Created {
        owner: Principal,
        heir: Principal,
        at: Timestamp,
    },

    /// Value arrived from any principal
    Deposited {
        from: Principal,
        amount: Amount,
        /// Balance after the deposit
        balance: Amount,
    },

    /// The owner withdrew (possibly zero, as a heartbeat).
    /// `amount` is owed to `owner` by the host.
    Withdrawn {
        owner: Principal,
        amount: Amount,
        /// Balance after the withdrawal
        balance: Amount,
        at: Timestamp,
    },

    /// The heir installed a new owner
    PossessionTaken {
        heir: Principal,
        previous_owner: Principal,
        new_owner: Principal,
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::Created { .. } => "created",
            LedgerEvent::Deposited { .. } => "deposited",
            LedgerEvent::Withdrawn { .. } => "withdrawn",
            LedgerEvent::PossessionTaken { .. } => "possession_taken",
        }
    }

    /// When the event happened, if the operation carried a timestamp.
    /// Deposits are not timed.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            LedgerEvent::Created { at, .. }
            | LedgerEvent::Withdrawn { at, .. }
            | LedgerEvent::PossessionTaken { at, .. } => Some(*at),
            LedgerEvent::Deposited { .. } => None,
        }
    }

    /// Whether this event resets the inactivity clock
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, LedgerEvent::Withdrawn { .. })
    }
}
