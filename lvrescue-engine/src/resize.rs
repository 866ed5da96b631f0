// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem resize adapter
//!
//! Dispatches the on-disk structure resize to the family-appropriate
//! primitive after the mandatory consistency check. Never retries; retry
//! policy belongs to the caller.

use lvrescue_types::FsKind;

use crate::error::{EngineError, Result};
use crate::ops::FilesystemOps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOp {
    /// Grow the filesystem to fill its (already extended) volume.
    Grow,
    /// Shrink the filesystem to an absolute byte size, ahead of reducing
    /// the volume under it.
    ShrinkTo(u64),
}

/// Resize the filesystem on `device_path`.
///
/// The extent family is checked with `e2fsck` first; a failed check aborts
/// the whole resize with no partial attempt. Xfs grows online through the
/// mount point (its own log recovery covers consistency) and cannot shrink.
pub fn resize<S: FilesystemOps>(
    ops: &S,
    device_path: &str,
    kind: FsKind,
    mount_point: &str,
    op: ResizeOp,
) -> Result<()> {
    match (kind, op) {
        (FsKind::Xfs, ResizeOp::Grow) => {
            ops.grow_xfs(mount_point)?;
        }
        (FsKind::Xfs, ResizeOp::ShrinkTo(_)) => {
            return Err(EngineError::ShrinkUnsupported {
                device: device_path.to_string(),
                kind: kind.to_string(),
            });
        }
        (FsKind::Extent, op) => {
            ops.check_filesystem(device_path)
                .map_err(|source| EngineError::ConsistencyCheck {
                    device: device_path.to_string(),
                    source,
                })?;
            match op {
                ResizeOp::Grow => ops.resize_extent(device_path, None)?,
                ResizeOp::ShrinkTo(bytes) => ops.resize_extent(device_path, Some(bytes))?,
            }
        }
    }

    tracing::info!(device_path, %kind, ?op, "resized filesystem");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeHost;

    #[test]
    fn extent_grow_checks_then_resizes() {
        let ops = FakeHost::default();
        resize(&ops, "/dev/vg0/data", FsKind::Extent, "/srv/data", ResizeOp::Grow).unwrap();
        assert_eq!(
            ops.calls(),
            vec!["e2fsck /dev/vg0/data", "resize2fs /dev/vg0/data"]
        );
    }

    #[test]
    fn failed_check_aborts_without_resize() {
        let ops = FakeHost::default();
        ops.fail_check_on("/dev/vg0/data");
        let err = resize(
            &ops,
            "/dev/vg0/data",
            FsKind::Extent,
            "/srv/data",
            ResizeOp::ShrinkTo(1024),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ConsistencyCheck { .. }));
        assert!(ops.calls().is_empty());
    }

    #[test]
    fn xfs_grows_online_through_the_mount_point() {
        let ops = FakeHost::default();
        resize(&ops, "/dev/vg0/logs", FsKind::Xfs, "/var/log/app", ResizeOp::Grow).unwrap();
        assert_eq!(ops.calls(), vec!["xfs_growfs /var/log/app"]);
    }

    #[test]
    fn xfs_shrink_is_rejected() {
        let ops = FakeHost::default();
        let err = resize(
            &ops,
            "/dev/vg0/logs",
            FsKind::Xfs,
            "/var/log/app",
            ResizeOp::ShrinkTo(1024),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ShrinkUnsupported { .. }));
    }
}
