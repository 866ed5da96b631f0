// SPDX-License-Identifier: GPL-3.0-only

//! In-memory host used by the engine tests.
//!
//! Models just enough of LVM accounting for the decision paths: extending
//! an LV consumes volume-group free extents, annexing a physical volume or
//! shrinking/removing an LV returns extents to the group. Every mutation
//! is recorded so tests can assert on the exact sequence of primitives.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use lvrescue_sys::{Result, SysError};
use lvrescue_types::InventorySnapshot;

use crate::ops::{FilesystemOps, Inventory, VolumeOps};

#[derive(Default)]
struct State {
    snapshot: InventorySnapshot,
    busy: HashMap<String, bool>,
    vg_free: HashMap<String, u64>,
    unattached_pvs: HashMap<String, u64>,
    lv_sizes: HashMap<String, u64>,
    mounted: HashMap<String, String>,
    fail_check: HashSet<String>,
    fail_resize: HashSet<String>,
    fail_extend_io: HashSet<String>,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<State>,
}

impl FakeHost {
    pub fn with_snapshot(snapshot: InventorySnapshot) -> Self {
        let mut state = State {
            snapshot: snapshot.clone(),
            ..State::default()
        };
        for vg in &snapshot.volume_groups {
            state.vg_free.insert(vg.name.clone(), vg.free);
        }
        for pv in &snapshot.physical_volumes {
            if !pv.is_assigned() {
                state.unattached_pvs.insert(pv.device.clone(), pv.size);
            }
        }
        for lv in &snapshot.logical_volumes {
            state.lv_sizes.insert(lv.device_path.clone(), lv.size);
        }
        for fs in &snapshot.filesystems {
            state.mounted.insert(fs.mount_point.clone(), fs.device.clone());
        }
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn set_busy(&self, mount_point: &str, busy: bool) {
        self.state
            .lock()
            .unwrap()
            .busy
            .insert(mount_point.to_string(), busy);
    }

    pub fn fail_check_on(&self, device_path: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_check
            .insert(device_path.to_string());
    }

    pub fn fail_resize_on(&self, device_path: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_resize
            .insert(device_path.to_string());
    }

    /// Make extending this volume fail as if the tool could not be spawned.
    pub fn fail_extend_io_on(&self, device_path: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_extend_io
            .insert(device_path.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn vg_free(&self, vg_name: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .vg_free
            .get(vg_name)
            .copied()
            .unwrap_or(0)
    }

    pub fn lv_size(&self, device_path: &str) -> Option<u64> {
        self.state.lock().unwrap().lv_sizes.get(device_path).copied()
    }

    pub fn is_mounted(&self, mount_point: &str) -> bool {
        self.state.lock().unwrap().mounted.contains_key(mount_point)
    }

    fn vg_of_device(state: &State, device_path: &str) -> Option<String> {
        state
            .snapshot
            .logical_volumes
            .iter()
            .find(|lv| {
                lv.device_path == device_path
                    || format!("/dev/mapper/{}", lv.mapper_name()) == device_path
            })
            .map(|lv| lv.vg_name.clone())
    }

    fn failed(command: &str, stderr: &str) -> SysError {
        SysError::CommandFailed {
            command: command.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

impl Inventory for FakeHost {
    fn collect_inventory(&self) -> Result<InventorySnapshot> {
        Ok(self.state.lock().unwrap().snapshot.clone())
    }
}

impl VolumeOps for FakeHost {
    fn extend_lv(&self, device_path: &str, delta: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_extend_io.contains(device_path) {
            return Err(SysError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file or directory",
            )));
        }
        let vg = Self::vg_of_device(&state, device_path)
            .ok_or_else(|| Self::failed("lvextend", "no such logical volume"))?;
        let free = state.vg_free.get(&vg).copied().unwrap_or(0);
        if free < delta {
            return Err(Self::failed("lvextend", "insufficient free space"));
        }
        state.vg_free.insert(vg, free - delta);
        *state.lv_sizes.entry(device_path.to_string()).or_insert(0) += delta;
        state.calls.push(format!("lvextend {device_path} +{delta}"));
        Ok(())
    }

    fn reduce_lv(&self, device_path: &str, new_size: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let vg = Self::vg_of_device(&state, device_path)
            .ok_or_else(|| Self::failed("lvreduce", "no such logical volume"))?;
        let old = state.lv_sizes.get(device_path).copied().unwrap_or(0);
        if new_size >= old {
            return Err(Self::failed("lvreduce", "new size is not smaller"));
        }
        *state.vg_free.entry(vg).or_insert(0) += old - new_size;
        state.lv_sizes.insert(device_path.to_string(), new_size);
        state.calls.push(format!("lvreduce {device_path} {new_size}"));
        Ok(())
    }

    fn remove_lv(&self, device_path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let vg = Self::vg_of_device(&state, device_path)
            .ok_or_else(|| Self::failed("lvremove", "no such logical volume"))?;
        let size = state
            .lv_sizes
            .remove(device_path)
            .ok_or_else(|| Self::failed("lvremove", "no such logical volume"))?;
        *state.vg_free.entry(vg).or_insert(0) += size;
        state.calls.push(format!("lvremove {device_path}"));
        Ok(())
    }

    fn annex_pv(&self, vg_name: &str, pv_device: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let size = state
            .unattached_pvs
            .remove(pv_device)
            .ok_or_else(|| Self::failed("vgextend", "no such physical volume"))?;
        *state.vg_free.entry(vg_name.to_string()).or_insert(0) += size;
        state.calls.push(format!("vgextend {vg_name} {pv_device}"));
        Ok(())
    }
}

impl FilesystemOps for FakeHost {
    fn is_busy(&self, mount_point: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .busy
            .get(mount_point)
            .copied()
            .unwrap_or(false))
    }

    fn unmount(&self, mount_point: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.busy.get(mount_point).copied().unwrap_or(false) {
            return Err(Self::failed("umount", "target is busy"));
        }
        state
            .mounted
            .remove(mount_point)
            .ok_or_else(|| Self::failed("umount", "not mounted"))?;
        state.calls.push(format!("umount {mount_point}"));
        Ok(())
    }

    fn mount(&self, device_path: &str, mount_point: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .mounted
            .insert(mount_point.to_string(), device_path.to_string());
        state.calls.push(format!("mount {device_path} {mount_point}"));
        Ok(())
    }

    fn check_filesystem(&self, device_path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_check.contains(device_path) {
            return Err(Self::failed("e2fsck", "filesystem has errors"));
        }
        state.calls.push(format!("e2fsck {device_path}"));
        Ok(())
    }

    fn grow_xfs(&self, mount_point: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("xfs_growfs {mount_point}"));
        Ok(())
    }

    fn resize_extent(&self, device_path: &str, new_size: Option<u64>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_resize.contains(device_path) {
            return Err(Self::failed("resize2fs", "resize failed"));
        }
        match new_size {
            Some(bytes) => state.calls.push(format!("resize2fs {device_path} {bytes}")),
            None => state.calls.push(format!("resize2fs {device_path}")),
        }
        Ok(())
    }
}
