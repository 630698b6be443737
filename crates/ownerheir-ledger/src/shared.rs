//! Thread-safe ledger handle
//!
//! One mutex guards the whole ledger, and the time for each operation is
//! read inside the lock, so operations apply one at a time in clock order.

use crate::events::LedgerEvent;
use crate::heartbeat::{evaluate_heartbeat, HeartbeatConfig, HeartbeatStatus};
use crate::ledger::{LedgerError, SuccessionLedger};
use ownerheir_core::{Amount, Clock, Principal};
use std::sync::{Arc, Mutex, MutexGuard};

/// A ledger shared between threads, paired with its clock
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<SuccessionLedger>>,
    clock: Arc<dyn Clock>,
}

impl SharedLedger {
    /// Construct a new ledger with `creator` as owner, timed by `clock`.
    pub fn create(creator: Principal, heir: Principal, clock: Arc<dyn Clock>) -> Self {
        let ledger = SuccessionLedger::new(creator, heir, clock.now());
        Self::from_ledger(ledger, clock)
    }

    /// Wrap an existing (e.g. loaded) ledger
    pub fn from_ledger(ledger: SuccessionLedger, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
            clock,
        }
    }

    // Operations never leave partial state, so a poisoned lock still holds
    // a consistent ledger.
    fn lock(&self) -> MutexGuard<'_, SuccessionLedger> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn deposit(&self, from: Principal, amount: Amount) -> Result<LedgerEvent, LedgerError> {
        self.lock().deposit(from, amount)
    }

    pub fn withdraw(&self, caller: &Principal, amount: Amount) -> Result<LedgerEvent, LedgerError> {
        let mut ledger = self.lock();
        ledger.withdraw(caller, amount, self.clock.now())
    }

    pub fn take_possession(
        &self,
        caller: &Principal,
        new_owner: Principal,
    ) -> Result<LedgerEvent, LedgerError> {
        let mut ledger = self.lock();
        ledger.take_possession(caller, new_owner, self.clock.now())
    }

    pub fn heartbeat(&self, config: &HeartbeatConfig) -> HeartbeatStatus {
        let ledger = self.lock();
        evaluate_heartbeat(&ledger, self.clock.now(), config)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SuccessionLedger {
        self.lock().clone()
    }
}
