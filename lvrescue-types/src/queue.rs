//! Durable retry-queue entry
//!
//! One comma-separated line per deferred filesystem:
//! `lv_name,kind,mount_point`. The queue file itself is managed by the
//! engine; this type only owns the line format.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filesystem::FsKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub lv_name: String,
    pub kind: FsKind,
    pub mount_point: String,
}

impl QueueEntry {
    /// Parse one queue-file line; `None` for malformed input.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim().splitn(3, ',');
        let lv_name = fields.next()?.trim();
        let kind = fields.next()?.trim().parse().ok()?;
        let mount_point = fields.next()?.trim();
        if lv_name.is_empty() || mount_point.is_empty() {
            return None;
        }
        Some(Self {
            lv_name: lv_name.to_string(),
            kind,
            mount_point: mount_point.to_string(),
        })
    }
}

impl fmt::Display for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.lv_name, self.kind, self.mount_point)
    }
}
