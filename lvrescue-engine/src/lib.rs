// SPDX-License-Identifier: GPL-3.0-only

//! Capacity rebalancing engine
//!
//! Decides which filesystem to extend, where the space comes from (volume
//! group free extents, unattached physical volumes, or donors), and
//! coordinates the unattended scan/retry workers through an advisory lock
//! and a durable queue. All system access goes through the traits in
//! [`ops`], so every decision path is testable against a fake host.

pub mod driver;
pub mod error;
pub mod extend;
pub mod lock;
pub mod ops;
pub mod predicates;
pub mod queue;
pub mod reclaim;
pub mod resize;

#[cfg(test)]
mod fake;

pub use driver::{run_scan, run_worker, ScanReport, WorkerReport};
pub use error::{EngineError, Result};
pub use extend::{extend_lv, extend_vg, ExtendOutcome};
pub use lock::ProcessLock;
pub use ops::{FilesystemOps, Inventory, RescueOps, VolumeOps};
pub use queue::RetryQueue;
pub use reclaim::reclaim;
pub use resize::{resize, ResizeOp};
