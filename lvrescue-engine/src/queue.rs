// SPDX-License-Identifier: GPL-3.0-only

//! Durable retry queue
//!
//! Busy candidates are deferred to a plain-text file, one entry per line,
//! and picked up by a later pass. The file is always rewritten whole:
//! read everything, build the new set, write it to a temporary file next
//! to the queue, rename over. A crash mid-pass leaves either the old or
//! the new file, never a half-written one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use lvrescue_types::QueueEntry;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct RetryQueue {
    path: PathBuf,
}

impl RetryQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries currently queued. A missing file is an empty queue.
    pub fn load(&self) -> Result<Vec<QueueEntry>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.io_error(error)),
        };

        let mut entries = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match QueueEntry::parse_line(line) {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::warn!(line, "dropping malformed queue entry");
                }
            }
        }
        Ok(entries)
    }

    /// Replace the queue contents atomically.
    pub fn store(&self, entries: &[QueueEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path).map_err(|error| self.io_error(error))?;
        for entry in entries {
            writeln!(file, "{entry}").map_err(|error| self.io_error(error))?;
        }
        file.sync_all().map_err(|error| self.io_error(error))?;
        fs::rename(&tmp_path, &self.path).map_err(|error| self.io_error(error))?;
        Ok(())
    }

    /// Add an entry unless its mount point is already queued.
    /// Returns whether the entry was added.
    pub fn enqueue(&self, entry: QueueEntry) -> Result<bool> {
        let mut entries = self.load()?;
        if entries
            .iter()
            .any(|existing| existing.mount_point == entry.mount_point)
        {
            tracing::debug!(mount_point = %entry.mount_point, "already queued");
            return Ok(false);
        }
        tracing::info!(mount_point = %entry.mount_point, lv = %entry.lv_name, "queued for retry");
        entries.push(entry);
        self.store(&entries)?;
        Ok(true)
    }

    fn io_error(&self, source: std::io::Error) -> EngineError {
        EngineError::QueueIo {
            path: self.path.clone(),
            source,
        }
    }
}
