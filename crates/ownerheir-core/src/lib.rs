//! OwnerHeir Core
//!
//! Shared types for the OwnerHeir succession ledger.
//!
//! - [`Principal`]: who is calling (HASH160 of a secp256k1 key)
//! - [`Amount`]: how much native value, in 18-decimal base units
//! - [`Timestamp`] and [`Clock`]: when, supplied by the host

pub mod amount;
pub mod principal;
pub mod time;

pub use amount::{Amount, AmountError};
pub use principal::{Principal, PrincipalError, Signer};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
