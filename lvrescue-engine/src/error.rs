// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use thiserror::Error;

use lvrescue_sys::SysError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Sys(#[from] SysError),

    #[error("queue io error for {path:?}: {source}")]
    QueueIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("lock error for {path:?}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("consistency check failed for {device}: {source}")]
    ConsistencyCheck { device: String, source: SysError },

    #[error("cannot shrink {device}: {kind} filesystems do not support shrinking")]
    ShrinkUnsupported { device: String, kind: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
