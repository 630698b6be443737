//! The ledger host: loads state, applies one operation, persists the result.
//!
//! Each mutating command runs under an exclusive lock file in the data
//! directory, so two invocations never interleave on the same ledger.

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use ownerheir_core::{Amount, Clock, Principal, Signer, Timestamp};
use ownerheir_ledger::{
    create_ledger, evaluate_heartbeat, load_ledger, save_ledger, EventJournal, HeartbeatStatus,
    LedgerError, LedgerEvent, SuccessionLedger,
};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOCK_FILE: &str = "ledger.lock";

/// Exclusive hold on a data directory, released on drop.
///
/// The lock file holds the PID of its owner. A lock whose owner is no
/// longer running is reclaimed.
#[derive(Debug)]
struct DataDirLock {
    path: PathBuf,
}

impl DataDirLock {
    fn acquire(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir: {}", data_dir.display()))?;
        let path = data_dir.join(LOCK_FILE);
        if let Some(lock) = Self::try_create(&path)? {
            return Ok(lock);
        }

        match lock_holder(&path) {
            Some(pid) if !process_alive(pid) => {
                log::warn!(
                    "Reclaiming stale lock {} left by process {}",
                    path.display(),
                    pid
                );
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove stale lock {}", path.display()))?;
                Self::try_create(&path)?.ok_or_else(|| {
                    anyhow::anyhow!("Ledger is busy: {} was taken concurrently", path.display())
                })
            }
            Some(pid) => anyhow::bail!(
                "Ledger is busy: held by process {} ({})",
                pid,
                path.display()
            ),
            None => anyhow::bail!(
                "Ledger is busy: {} exists (remove it if no other ownerheir process is running)",
                path.display()
            ),
        }
    }

    fn try_create(path: &Path) -> Result<Option<Self>> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                // Guard first, so a failed write still removes the file
                let lock = Self {
                    path: path.to_path_buf(),
                };
                write!(file, "{}", std::process::id())
                    .with_context(|| format!("Failed to write lock file {}", path.display()))?;
                Ok(Some(lock))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to create lock file {}", path.display()))
            }
        }
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}

fn lock_holder(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// No portable liveness check elsewhere; never reclaim.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Executes ledger operations against the configured data directory
pub struct Host {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
}

impl Host {
    pub fn new(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    fn journal(&self) -> EventJournal<PathBuf> {
        EventJournal::new(self.config.journal_path())
    }

    /// Construct the ledger with the caller as owner
    pub fn init(&self, caller: &Signer, heir: Principal) -> Result<LedgerEvent> {
        let _lock = DataDirLock::acquire(&self.config.server.data_dir)?;
        let now = self.clock.now();
        let ledger = SuccessionLedger::new(caller.principal(), heir, now);
        create_ledger(&ledger, &self.config.ledger_path())
            .context("Failed to create ledger")?;

        let event = LedgerEvent::Created {
            owner: ledger.owner(),
            heir: ledger.heir(),
            at: now,
        };
        self.record(&event);
        Ok(event)
    }

    pub fn deposit(&self, caller: &Signer, amount: Amount) -> Result<LedgerEvent> {
        let from = caller.principal();
        self.apply(|ledger, _| ledger.deposit(from, amount))
    }

    pub fn withdraw(&self, caller: &Signer, amount: Amount) -> Result<LedgerEvent> {
        let caller = caller.principal();
        self.apply(|ledger, now| ledger.withdraw(&caller, amount, now))
    }

    pub fn take_possession(&self, caller: &Signer, new_owner: Principal) -> Result<LedgerEvent> {
        let caller = caller.principal();
        self.apply(|ledger, now| ledger.take_possession(&caller, new_owner, now))
    }

    /// Current ledger and heartbeat, read without taking the lock
    pub fn status(&self) -> Result<(SuccessionLedger, HeartbeatStatus)> {
        let ledger = self.load()?;
        let status = evaluate_heartbeat(&ledger, self.clock.now(), &self.config.heartbeat);
        Ok((ledger, status))
    }

    /// Time of the most recent journaled heartbeat, if any
    pub fn last_heartbeat(&self) -> Result<Option<Timestamp>> {
        let events = self
            .journal()
            .read_all()
            .context("Failed to read event journal")?;
        Ok(events
            .iter()
            .rev()
            .filter(|event| event.is_heartbeat())
            .find_map(LedgerEvent::timestamp))
    }

    fn load(&self) -> Result<SuccessionLedger> {
        let path = self.config.ledger_path();
        load_ledger(&path)
            .with_context(|| format!("Failed to load ledger from {}", path.display()))?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No ledger at {} (run `ownerheir init --heir <PRINCIPAL>` first)",
                    path.display()
                )
            })
    }

    /// Load, apply one operation, save. Nothing is written if the operation fails.
    ///
    /// The save is the commit point: once it succeeds the event is returned,
    /// even if journaling it fails.
    fn apply<F>(&self, op: F) -> Result<LedgerEvent>
    where
        F: FnOnce(&mut SuccessionLedger, Timestamp) -> Result<LedgerEvent, LedgerError>,
    {
        let _lock = DataDirLock::acquire(&self.config.server.data_dir)?;
        let mut ledger = self.load()?;

        let event = op(&mut ledger, self.clock.now())?;

        save_ledger(&ledger, &self.config.ledger_path()).context("Failed to save ledger")?;
        self.record(&event);
        log::debug!("Applied {} event", event.kind());
        Ok(event)
    }

    fn record(&self, event: &LedgerEvent) {
        if let Err(e) = self.journal().append(event) {
            log::error!(
                "Ledger saved but {} event was not journaled to {}: {}",
                event.kind(),
                self.config.journal_path().display(),
                e
            );
        }
    }
}
