// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for capacity rescue
//!
//! This crate wraps every external interface the engine consumes:
//! - Inventory collection (`pvs`/`vgs`/`lvs`/`df` invocation and parsing)
//! - Write-rate sampling from `/proc/diskstats`
//! - Mount-point busy probing via `lsof`
//! - The mutation primitives (lvextend, lvreduce, vgextend, umount, mount,
//!   e2fsck, resize2fs, xfs_growfs)
//!
//! These operations require elevated privileges and are only called from
//! the lvrescue binary after its privilege check.

pub mod cmd;
pub mod diskstats;
pub mod error;
pub mod fs_ops;
pub mod host;
pub mod inventory;
pub mod lvm_ops;
pub mod mounts;

pub use error::{Result, SysError};
pub use host::HostSystem;
pub use inventory::require_lvm_tools;
