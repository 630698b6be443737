//! Persistent ledger state and event journal
//!
//! The ledger file holds exactly the four durable fields as JSON. The
//! journal is an append-only JSON-lines record of emitted events.

use crate::events::LedgerEvent;
use crate::ledger::SuccessionLedger;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Errors from state operations
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ledger already exists at {0}")]
    AlreadyExists(String),
}

/// Load a ledger from file. `None` if no ledger has been created yet.
pub fn load_ledger(path: &Path) -> Result<Option<SuccessionLedger>, StateError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    let ledger: SuccessionLedger = serde_json::from_str(&contents)?;
    log::debug!("Loaded ledger from {}", path.display());
    Ok(Some(ledger))
}

/// Save a ledger to file.
///
/// Writes a sibling temp file and renames it over the target, so a crash
/// mid-write leaves the previous state intact.
pub fn save_ledger(ledger: &SuccessionLedger, path: &Path) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(ledger)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    log::debug!("Saved ledger to {}", path.display());
    Ok(())
}

/// Save a freshly constructed ledger, refusing to replace an existing one.
pub fn create_ledger(ledger: &SuccessionLedger, path: &Path) -> Result<(), StateError> {
    if path.exists() {
        return Err(StateError::AlreadyExists(path.display().to_string()));
    }
    save_ledger(ledger, path)
}

/// Append-only event journal
#[derive(Debug, Clone)]
pub struct EventJournal<P: AsRef<Path>> {
    path: P,
}

impl<P: AsRef<Path>> EventJournal<P> {
    pub fn new(path: P) -> Self {
        Self { path }
    }

    /// Append one event as a JSON line
    pub fn append(&self, event: &LedgerEvent) -> Result<(), StateError> {
        let path = self.path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Read every event in order. Empty if the journal does not exist.
    pub fn read_all(&self) -> Result<Vec<LedgerEvent>, StateError> {
        let path = self.path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }
}
