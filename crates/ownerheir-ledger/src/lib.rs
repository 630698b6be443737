//! OwnerHeir Succession Ledger
//!
//! A custodial balance with a dead-man's switch: the owner withdraws, the
//! heir may take over once the owner has been inactive for 30 days.
//!
//! # Concepts
//!
//! - **Owner**: the only principal who may withdraw
//! - **Heir**: fixed at creation; may install a new owner after the cooldown
//! - **Heartbeat**: any owner withdrawal, zero included, restarts the cooldown
//! - **Deposit**: anyone may add value at any time
//!
//! # Example
//!
//! ```
//! use ownerheir_core::{Amount, Signer, Timestamp};
//! use ownerheir_ledger::{SuccessionLedger, COOLDOWN_PERIOD};
//!
//! let owner = Signer::generate().principal();
//! let heir = Signer::generate().principal();
//! let t0 = Timestamp::from_unix_secs(1_700_000_000);
//!
//! let mut ledger = SuccessionLedger::new(owner, heir, t0);
//! ledger.deposit(owner, Amount::from_whole(1)).unwrap();
//!
//! // Too early for the heir
//! assert!(ledger.take_possession(&heir, heir, t0).is_err());
//!
//! // After 30 days of silence the heir takes over
//! let later = t0.saturating_add(COOLDOWN_PERIOD);
//! ledger.take_possession(&heir, heir, later).unwrap();
//! assert_eq!(ledger.owner(), heir);
//! ```

pub mod events;
pub mod heartbeat;
pub mod ledger;
pub mod shared;
pub mod state;

pub use events::LedgerEvent;
pub use heartbeat::{
    evaluate_heartbeat, HeartbeatAction, HeartbeatConfig, HeartbeatError, HeartbeatStatus,
};
pub use ledger::{LedgerError, Role, SuccessionLedger, COOLDOWN_PERIOD};
pub use shared::SharedLedger;
pub use state::{create_ledger, load_ledger, save_ledger, EventJournal, StateError};
