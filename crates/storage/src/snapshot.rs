// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! Snapshots store the complete ledger state at a point in time, identified
//! by the WAL sequence number. Recovery loads the snapshot and replays WAL
//! entries after that sequence.

use crate::state::LedgerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

/// A snapshot of the ledger state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version
    #[serde(rename = "v")]
    pub version: u32,
    /// WAL sequence number at the time of snapshot
    pub seq: u64,
    pub state: LedgerState,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: LedgerState) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at: Utc::now() }
    }

    /// Write the snapshot as zstd-compressed JSON, atomically via a temp file.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let file = BufWriter::new(File::create(&tmp)?);
            let mut encoder = zstd::Encoder::new(file, ZSTD_LEVEL)?;
            serde_json::to_writer(&mut encoder, self)?;
            let mut file = encoder.finish()?;
            file.flush()?;
            file.get_ref().sync_data()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load a snapshot, or `None` when there is none.
    ///
    /// An undecodable snapshot is an error and stays in place; see
    /// [`Snapshot::set_aside`] for discarding it.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }
        let snapshot = Self::decode(path)?;
        if snapshot.version > CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snapshot.version));
        }
        Ok(Some(snapshot))
    }

    /// Move an unusable snapshot to the next `.bak` slot, returning that path.
    pub fn set_aside(path: &Path) -> Result<PathBuf, SnapshotError> {
        let bak = rotate_bak_path(path);
        fs::rename(path, &bak)?;
        Ok(bak)
    }

    fn decode(path: &Path) -> Result<Self, SnapshotError> {
        let decoder = zstd::Decoder::new(BufReader::new(File::open(path)?))?;
        Ok(serde_json::from_reader(decoder)?)
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
