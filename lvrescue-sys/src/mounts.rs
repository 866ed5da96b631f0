// SPDX-License-Identifier: GPL-3.0-only

//! Mount, unmount, and busy probing.

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::cmd;
use crate::error::Result;

/// Check whether any process holds open handles under a mount point.
///
/// `lsof +D` exits zero with output when handles exist, nonzero when the
/// tree is quiet. Processes release handles asynchronously after an
/// unmount attempt, so a busy first probe is retried once after
/// `settle_delay` before concluding "busy".
pub fn is_busy(mount_point: &str, settle_delay: Duration) -> Result<bool> {
    if !probe_busy(mount_point)? {
        return Ok(false);
    }
    thread::sleep(settle_delay);
    probe_busy(mount_point)
}

fn probe_busy(mount_point: &str) -> Result<bool> {
    let status = Command::new("lsof")
        .args(["+D", mount_point])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    Ok(status.success())
}

pub fn unmount(mount_point: &str, dry_run: bool) -> Result<()> {
    cmd::run("umount", &[mount_point], dry_run)?;
    tracing::info!(mount_point, "unmounted filesystem");
    Ok(())
}

pub fn mount(device: &str, mount_point: &str, dry_run: bool) -> Result<()> {
    cmd::run("mount", &[device, mount_point], dry_run)?;
    tracing::info!(device, mount_point, "mounted filesystem");
    Ok(())
}
