//! Durable identifier ledger
//!
//! Tracks which case identifiers have reached a terminal outcome. Two flat
//! files back the two sets, one identifier per line. Incremental marks are
//! append-only, so a crash loses at most the unflushed tail and never
//! corrupts earlier entries; the failed set is rewritten wholesale only
//! during retry reconciliation.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Durable record of terminal outcomes, keyed by case identifier
///
/// An identifier is in at most one of the two sets at any time. Membership
/// is monotone: the only way out of `failed` is a successful bounded retry,
/// which moves the identifier to `done`. The ledger is the sole writer of
/// its two backing files.
#[derive(Debug)]
pub struct IdentifierLedger {
    done: HashSet<u64>,
    failed: HashSet<u64>,
    done_path: PathBuf,
    failed_path: PathBuf,
}

impl IdentifierLedger {
    /// Loads both sets from disk
    ///
    /// A missing backing file is not an error; the corresponding set starts
    /// empty. Blank lines are ignored and unparsable lines are skipped with
    /// a warning.
    pub fn load(done_path: &Path, failed_path: &Path) -> LedgerResult<Self> {
        let done = read_id_file(done_path)?;
        let failed = read_id_file(failed_path)?;

        Ok(Self {
            done,
            failed,
            done_path: done_path.to_path_buf(),
            failed_path: failed_path.to_path_buf(),
        })
    }

    /// Returns true if the identifier already has a terminal outcome
    pub fn is_resolved(&self, id: u64) -> bool {
        self.done.contains(&id) || self.failed.contains(&id)
    }

    /// Returns true if the identifier is in the failed set
    pub fn is_failed(&self, id: u64) -> bool {
        self.failed.contains(&id)
    }

    /// Returns true if the identifier is in the done set
    pub fn is_done(&self, id: u64) -> bool {
        self.done.contains(&id)
    }

    /// Number of identifiers with a Done outcome
    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    /// Number of identifiers with a Failed outcome
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Snapshot of the failed set in ascending order
    pub fn failed_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.failed.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Idempotently records a Done outcome
    ///
    /// Appends to the done file only on first insertion. A retry success
    /// also leaves the in-memory failed set here; the failed file itself is
    /// updated later by `reconcile_failed`.
    pub fn mark_done(&mut self, id: u64) -> LedgerResult<()> {
        if self.done.insert(id) {
            append_id(&self.done_path, id)?;
        }
        self.failed.remove(&id);
        Ok(())
    }

    /// Idempotently records a Failed outcome, appending on first insertion
    pub fn mark_failed(&mut self, id: u64) -> LedgerResult<()> {
        if self.failed.insert(id) {
            append_id(&self.failed_path, id)?;
        }
        Ok(())
    }

    /// Replaces the persisted failed set wholesale
    ///
    /// Used after a retry pass to drop identifiers that succeeded. This is
    /// the one operation that rewrites a ledger file instead of appending.
    pub fn reconcile_failed(&mut self, still_failed: HashSet<u64>) -> LedgerResult<()> {
        let mut file = File::create(&self.failed_path).map_err(|source| LedgerError::Io {
            path: self.failed_path.clone(),
            source,
        })?;

        let mut ids: Vec<u64> = still_failed.iter().copied().collect();
        ids.sort_unstable();
        for id in ids {
            writeln!(file, "{}", id).map_err(|source| LedgerError::Io {
                path: self.failed_path.clone(),
                source,
            })?;
        }

        self.failed = still_failed;
        Ok(())
    }
}

/// Reads a one-identifier-per-line file into a set; missing file means empty
fn read_id_file(path: &Path) -> LedgerResult<HashSet<u64>> {
    let mut ids = HashSet::new();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
        Err(source) => {
            return Err(LedgerError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.parse::<u64>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) => {
                tracing::warn!("Skipping unparsable ledger line in {}: {trimmed:?}", path.display());
            }
        }
    }

    Ok(ids)
}

/// Appends a single identifier line, creating the file if needed
fn append_id(path: &Path, id: u64) -> LedgerResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    writeln!(file, "{}", id).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })
}
