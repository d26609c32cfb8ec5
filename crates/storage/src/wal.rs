// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of ledger events.
//!
//! Each line is one JSON-encoded [`WalEntry`]. An entry is written with a
//! single `write_all`, so a committed operation is either fully in the log
//! or (after a torn write) detected as corrupt on the next open.

use crate::snapshot::rotate_bak_path;
use ferry_core::LedgerEvent;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One sequenced event in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: LedgerEvent,
}

#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
    file: File,
    /// Sequence of the last entry written
    write_seq: u64,
    /// Sequence already folded into the snapshot the log was opened against
    processed_seq: u64,
}

impl Wal {
    /// Open (or create) the log at `path`.
    ///
    /// Valid entries are kept. If a line fails to parse, the original file is
    /// rotated to `.bak` and the log is rewritten with only the entries read
    /// before the corruption.
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (entries, corrupt) =
            if path.exists() { read_entries(path)? } else { (Vec::new(), false) };

        if corrupt {
            let bak = rotate_bak_path(path);
            tracing::warn!(
                path = %path.display(),
                bak = %bak.display(),
                recovered = entries.len(),
                "corrupt WAL, rotating to backup"
            );
            fs::rename(path, &bak)?;
            write_entries(path, &entries)?;
        }

        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0).max(processed_seq);
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self { path: path.to_path_buf(), file, write_seq, processed_seq })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append an event, returning its sequence number.
    pub fn append(&mut self, event: &LedgerEvent) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let mut line = serde_json::to_string(&WalEntry { seq, event: event.clone() })?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.write_seq = seq;
        Ok(seq)
    }

    /// Force appended entries to stable storage.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    /// All entries with `seq > after`, in order.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        let (entries, _) = read_entries(&self.path)?;
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Drop entries with `seq < keep_from`, rewriting the file atomically.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        let (entries, _) = read_entries(&self.path)?;
        let kept: Vec<WalEntry> = entries.into_iter().filter(|e| e.seq >= keep_from).collect();

        let tmp = self.path.with_extension("tmp");
        write_entries(&tmp, &kept)?;
        fs::rename(&tmp, &self.path)?;

        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.processed_seq = self.processed_seq.max(keep_from.saturating_sub(1));
        Ok(())
    }
}

/// Read entries until the first unparseable line; the flag reports corruption.
fn read_entries(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    after_seq = entries.last().map(|e| e.seq),
                    "WAL parse error"
                );
                return Ok((entries, true));
            }
        }
    }
    Ok((entries, false))
}

fn write_entries(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
    let mut file = File::create(path)?;
    for entry in entries {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
    }
    file.sync_data()?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
