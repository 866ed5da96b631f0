// SPDX-License-Identifier: GPL-3.0-only

//! Write-rate sampling from `/proc/diskstats`
//!
//! Two samples a short interval apart give a per-device write rate in
//! bytes per second (sectors are always 512 bytes in this interface).
//! Device-mapper paths are resolved to their `dm-*` kernel names through
//! the `/dev/mapper` symlinks.

use std::collections::HashMap;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;

const SECTOR_SIZE: u64 = 512;

/// `sectors_written` per device, keyed by kernel name (`sda`, `dm-3`, ...).
pub fn parse_sectors_written(content: &str) -> HashMap<String, u64> {
    let mut devices = HashMap::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        // major minor name rd_ios rd_merges rd_sectors rd_ticks
        // wr_ios wr_merges wr_sectors wr_ticks ...
        if parts.len() < 14 {
            continue;
        }
        let Ok(sectors_written) = parts[9].parse::<u64>() else {
            continue;
        };
        devices.insert(parts[2].to_string(), sectors_written);
    }

    devices
}

/// Sample write rates over `interval`, in bytes per second per kernel
/// device name.
pub fn sample_write_rates(interval: Duration) -> Result<HashMap<String, u64>> {
    let first = std::fs::read_to_string("/proc/diskstats")?;
    let started = Instant::now();
    thread::sleep(interval);
    let second = std::fs::read_to_string("/proc/diskstats")?;
    let elapsed = started.elapsed();

    Ok(rates_between(
        &parse_sectors_written(&first),
        &parse_sectors_written(&second),
        elapsed,
    ))
}

pub fn rates_between(
    first: &HashMap<String, u64>,
    second: &HashMap<String, u64>,
    elapsed: Duration,
) -> HashMap<String, u64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return HashMap::new();
    }

    second
        .iter()
        .filter_map(|(device, &after)| {
            let before = *first.get(device)?;
            let delta_bytes = after.saturating_sub(before) * SECTOR_SIZE;
            Some((device.clone(), (delta_bytes as f64 / secs) as u64))
        })
        .collect()
}

/// Rate for a device path, resolving `/dev/mapper/*` symlinks to kernel
/// names. Unresolvable devices report zero rather than failing the scan.
pub fn rate_for_device(rates: &HashMap<String, u64>, device: &str) -> u64 {
    let path = Path::new(device);
    let kernel_name = match std::fs::read_link(path) {
        Ok(target) => target
            .file_name()
            .map(|name| name.to_string_lossy().to_string()),
        Err(_) => path
            .file_name()
            .map(|name| name.to_string_lossy().to_string()),
    };

    match kernel_name {
        Some(name) => rates.get(&name).copied().unwrap_or(0),
        None => 0,
    }
}
