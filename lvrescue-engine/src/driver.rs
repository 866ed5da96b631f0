// SPDX-License-Identifier: GPL-3.0-only

//! Rebalance driver
//!
//! Two entry points share one per-candidate state machine: `run_scan`
//! services everything over the fill threshold right now, `run_worker`
//! drains the durable queue of candidates that were busy earlier. Both
//! run under the cross-process lock and recover every failure at the
//! level of a single candidate.

use std::cmp::Reverse;
use std::thread;
use std::time::Duration;

use lvrescue_types::{
    ExtensionRequest, FilesystemUsage, FsKind, InventorySnapshot, QueueEntry, RescueConfig,
};

use crate::error::Result;
use crate::extend::{extend_lv, ExtendOutcome};
use crate::lock::ProcessLock;
use crate::ops::RescueOps;
use crate::queue::RetryQueue;
use crate::resize::{resize, ResizeOp};

/// Lifecycle of one candidate within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateState {
    Scanned,
    Queued,
    Unmounting,
    Unmounted,
    Resizing,
    Resized,
    Remounted,
    Done,
    ResizeFailed,
    ReportedError,
}

fn advance(mount_point: &str, state: &mut CandidateState, next: CandidateState) {
    tracing::debug!(mount_point, from = ?state, to = ?next, "candidate state");
    *state = next;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateOutcome {
    Done,
    Busy,
    Failed,
    Unsatisfiable,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    /// Another instance held the lock; nothing was scanned.
    pub skipped: bool,
    pub extended: Vec<String>,
    pub queued: Vec<String>,
    pub failed: Vec<String>,
    pub unsatisfiable: Vec<String>,
}

#[derive(Debug, Default)]
pub struct WorkerReport {
    /// Another instance held the lock; nothing was processed.
    pub skipped: bool,
    pub extended: usize,
    pub dropped: usize,
    pub kept: usize,
}

/// One scanning pass: every filesystem at or above the fill threshold,
/// fastest-filling first. Busy candidates land in the durable queue.
pub fn run_scan<S: RescueOps>(ops: &S, config: &RescueConfig) -> Result<ScanReport> {
    let Some(_lock) = ProcessLock::try_acquire(&config.lock_path)? else {
        tracing::info!("another instance is active, exiting");
        return Ok(ScanReport {
            skipped: true,
            ..Default::default()
        });
    };

    let snapshot = ops.collect_inventory()?;
    let queue = RetryQueue::new(&config.queue_path);
    let mut report = ScanReport::default();

    let mut candidates: Vec<&FilesystemUsage> = snapshot
        .filesystems
        .iter()
        .filter(|fs| fs.usage_percent() >= config.fill_threshold_percent as u32)
        .collect();
    // Fastest-filling candidates are closest to hard failure.
    candidates.sort_by_key(|fs| Reverse(fs.write_rate));

    for fs in candidates {
        tracing::info!(
            mount_point = %fs.mount_point,
            used_percent = fs.usage_percent(),
            write_rate = fs.write_rate,
            "filesystem over fill threshold"
        );
        match process_candidate(ops, &snapshot, config, fs) {
            CandidateOutcome::Done => report.extended.push(fs.mount_point.clone()),
            CandidateOutcome::Busy => {
                let entry = QueueEntry {
                    lv_name: fs.lv_name().to_string(),
                    kind: fs.kind,
                    mount_point: fs.mount_point.clone(),
                };
                queue.enqueue(entry)?;
                report.queued.push(fs.mount_point.clone());
            }
            CandidateOutcome::Failed => report.failed.push(fs.mount_point.clone()),
            CandidateOutcome::Unsatisfiable => report.unsatisfiable.push(fs.mount_point.clone()),
        }
    }

    Ok(report)
}

/// Drain the durable queue. The lock is yielded every few processed
/// entries so a fresh scanning pass gets a fair chance; if it cannot be
/// re-taken the batch stops and the rest stays queued.
pub fn run_worker<S: RescueOps>(ops: &S, config: &RescueConfig) -> Result<WorkerReport> {
    let queue = RetryQueue::new(&config.queue_path);
    let mut lock = match ProcessLock::try_acquire(&config.lock_path)? {
        Some(guard) => Some(guard),
        None => {
            tracing::info!("another instance is active, exiting");
            return Ok(WorkerReport {
                skipped: true,
                ..Default::default()
            });
        }
    };

    let mut report = WorkerReport::default();
    loop {
        let entries = queue.load()?;
        if entries.is_empty() {
            tracing::info!("retry queue is empty");
            break;
        }

        let snapshot = ops.collect_inventory()?;
        let mut remaining = Vec::new();
        let mut progressed = false;
        let mut processed: u32 = 0;
        let mut lock_lost = false;

        for entry in entries {
            if lock_lost {
                remaining.push(entry);
                continue;
            }

            match process_entry(ops, &snapshot, config, &entry) {
                EntryResult::Extended => {
                    report.extended += 1;
                    progressed = true;
                    processed += 1;
                }
                EntryResult::Dropped => {
                    report.dropped += 1;
                    progressed = true;
                }
                EntryResult::Keep => remaining.push(entry),
            }

            if processed > 0 && processed % config.worker_yield_every == 0 {
                // Give a waiting scan pass a fair chance at the lock.
                lock = None;
                thread::sleep(Duration::from_secs(config.worker_yield_sleep_secs));
                match ProcessLock::try_acquire(&config.lock_path)? {
                    Some(guard) => lock = Some(guard),
                    None => {
                        tracing::info!("lock re-acquisition failed, stopping this batch");
                        lock_lost = true;
                    }
                }
                processed = 0;
            }
        }

        report.kept = remaining.len();
        queue.store(&remaining)?;

        if lock_lost || !progressed {
            break;
        }
    }

    drop(lock);
    Ok(report)
}

enum EntryResult {
    Extended,
    Dropped,
    Keep,
}

fn process_entry<S: RescueOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    config: &RescueConfig,
    entry: &QueueEntry,
) -> EntryResult {
    let Some(fs) = snapshot
        .filesystems
        .iter()
        .find(|fs| fs.mount_point == entry.mount_point)
    else {
        tracing::warn!(mount_point = %entry.mount_point, "queued filesystem is no longer mounted, dropping entry");
        return EntryResult::Dropped;
    };

    if fs.usage_percent() < config.fill_threshold_percent as u32 {
        tracing::info!(mount_point = %entry.mount_point, "queued filesystem dropped back under the threshold");
        return EntryResult::Dropped;
    }

    match process_candidate(ops, snapshot, config, fs) {
        CandidateOutcome::Done => EntryResult::Extended,
        // Permanently unservable entries are removed, not retried forever.
        CandidateOutcome::Unsatisfiable => EntryResult::Dropped,
        CandidateOutcome::Busy | CandidateOutcome::Failed => EntryResult::Keep,
    }
}

/// Walk one candidate through unmount, extension, resize, and remount.
/// Never propagates a failure: the mount is restored and the outcome
/// reported, so the rest of the pass continues.
fn process_candidate<S: RescueOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    config: &RescueConfig,
    fs: &FilesystemUsage,
) -> CandidateOutcome {
    let mount_point = fs.mount_point.as_str();
    let mut state = CandidateState::Scanned;

    match ops.is_busy(mount_point) {
        Ok(false) => {}
        Ok(true) => {
            advance(mount_point, &mut state, CandidateState::Queued);
            return CandidateOutcome::Busy;
        }
        Err(error) => {
            tracing::warn!(mount_point, %error, "busy probe failed, deferring candidate");
            advance(mount_point, &mut state, CandidateState::Queued);
            return CandidateOutcome::Busy;
        }
    }

    let Some(lv) = snapshot.lv_for_filesystem(fs) else {
        tracing::error!(mount_point, device = %fs.device, "no logical volume found for filesystem");
        return CandidateOutcome::Failed;
    };

    advance(mount_point, &mut state, CandidateState::Unmounting);
    if let Err(error) = ops.unmount(mount_point) {
        tracing::error!(mount_point, %error, "unmount failed");
        advance(mount_point, &mut state, CandidateState::ReportedError);
        return CandidateOutcome::Failed;
    }
    advance(mount_point, &mut state, CandidateState::Unmounted);

    let request = ExtensionRequest {
        vg_name: lv.vg_name.clone(),
        lv_name: lv.name.clone(),
        delta: config.extend_step_bytes,
    };
    let extended = match extend_lv(ops, snapshot, config, &request) {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!(mount_point, %error, "extension failed");
            remount(ops, fs);
            advance(mount_point, &mut state, CandidateState::ReportedError);
            return CandidateOutcome::Failed;
        }
    };
    if extended == ExtendOutcome::Unsatisfiable {
        remount(ops, fs);
        advance(mount_point, &mut state, CandidateState::ReportedError);
        return CandidateOutcome::Unsatisfiable;
    }

    // The extent family resizes offline, before the remount; xfs grows
    // online, after it.
    let resize_result = match fs.kind {
        FsKind::Extent => {
            advance(mount_point, &mut state, CandidateState::Resizing);
            let result = resize(ops, &fs.device, fs.kind, mount_point, ResizeOp::Grow);
            remount(ops, fs);
            advance(mount_point, &mut state, CandidateState::Remounted);
            result
        }
        FsKind::Xfs => {
            remount(ops, fs);
            advance(mount_point, &mut state, CandidateState::Remounted);
            advance(mount_point, &mut state, CandidateState::Resizing);
            resize(ops, &fs.device, fs.kind, mount_point, ResizeOp::Grow)
        }
    };

    match resize_result {
        Ok(()) => {
            advance(mount_point, &mut state, CandidateState::Resized);
            advance(mount_point, &mut state, CandidateState::Done);
            tracing::info!(mount_point, "filesystem extended");
            CandidateOutcome::Done
        }
        Err(error) => {
            tracing::error!(mount_point, %error, "resize failed");
            advance(mount_point, &mut state, CandidateState::ResizeFailed);
            advance(mount_point, &mut state, CandidateState::ReportedError);
            CandidateOutcome::Failed
        }
    }
}

fn remount<S: RescueOps>(ops: &S, fs: &FilesystemUsage) {
    if let Err(error) = ops.mount(&fs.device, &fs.mount_point) {
        tracing::error!(mount_point = %fs.mount_point, %error, "failed to restore mount");
    }
}
