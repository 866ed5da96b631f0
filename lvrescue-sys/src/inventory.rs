// SPDX-License-Identifier: GPL-3.0-only

//! Inventory collection
//!
//! Builds the per-scan [`InventorySnapshot`] from LVM reporting tools and
//! `df`. LVM tools are invoked with `--units b --nosuffix` so their numbers
//! arrive as exact bytes; `df` output is suffixed and locale-variant and
//! goes through the normalization boundary exactly once, here.

use std::time::Duration;

use lvrescue_types::{
    parse_size, FilesystemUsage, FsKind, InventorySnapshot, LogicalVolumeInfo, PhysicalVolumeInfo,
    VolumeGroupInfo,
};

use crate::cmd;
use crate::diskstats;
use crate::error::{Result, SysError};

/// Collect a fresh snapshot of all four inventory tables.
///
/// `sample_interval` is the spacing between the two `/proc/diskstats`
/// samples used to measure per-device write rates.
pub fn collect(sample_interval: Duration) -> Result<InventorySnapshot> {
    require_lvm_tools()?;

    let vgs_output = cmd::run(
        "vgs",
        &[
            "--noheadings",
            "--units",
            "b",
            "--nosuffix",
            "-o",
            "vg_name,vg_size,vg_free,pv_count,lv_count",
            "--separator",
            "\t",
        ],
        false,
    )?;
    let lvs_output = cmd::run(
        "lvs",
        &[
            "--noheadings",
            "--units",
            "b",
            "--nosuffix",
            "-o",
            "lv_name,vg_name,lv_size,lv_path",
            "--separator",
            "\t",
        ],
        false,
    )?;
    let pvs_output = cmd::run(
        "pvs",
        &[
            "--noheadings",
            "--units",
            "b",
            "--nosuffix",
            "-o",
            "pv_name,vg_name,pv_size,pv_free",
            "--separator",
            "\t",
        ],
        false,
    )?;
    let df_output = cmd::run(
        "df",
        &["-h", "--output=source,fstype,size,used,avail,target"],
        false,
    )?;

    let mut filesystems = parse_df(&df_output.stdout)?;
    let rates = diskstats::sample_write_rates(sample_interval)?;
    for fs in &mut filesystems {
        fs.write_rate = diskstats::rate_for_device(&rates, &fs.device);
    }

    Ok(InventorySnapshot {
        volume_groups: parse_vgs(&vgs_output.stdout),
        logical_volumes: parse_lvs(&lvs_output.stdout),
        physical_volumes: parse_pvs(&pvs_output.stdout),
        filesystems,
    })
}

/// Fail fast when the LVM reporting or mutation tools are not installed.
pub fn require_lvm_tools() -> Result<()> {
    for tool in [
        "vgs", "lvs", "pvs", "lvextend", "lvreduce", "lvremove", "vgextend",
    ] {
        if which::which(tool).is_err() {
            return Err(SysError::ToolMissing(tool.to_string()));
        }
    }
    Ok(())
}

fn parse_tabbed_line(line: &str) -> Vec<String> {
    line.split('\t')
        .map(|part| part.trim().to_string())
        .collect()
}

pub fn parse_vgs(output: &str) -> Vec<VolumeGroupInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let cols = parse_tabbed_line(line);
            if cols.len() < 5 {
                return None;
            }
            Some(VolumeGroupInfo {
                name: cols[0].clone(),
                size: cols[1].parse().ok()?,
                free: cols[2].parse().ok()?,
                pv_count: cols[3].parse().ok()?,
                lv_count: cols[4].parse().ok()?,
            })
        })
        .collect()
}

pub fn parse_lvs(output: &str) -> Vec<LogicalVolumeInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let cols = parse_tabbed_line(line);
            if cols.len() < 4 {
                return None;
            }
            Some(LogicalVolumeInfo {
                name: cols[0].clone(),
                vg_name: cols[1].clone(),
                size: cols[2].parse().ok()?,
                device_path: cols[3].clone(),
            })
        })
        .collect()
}

pub fn parse_pvs(output: &str) -> Vec<PhysicalVolumeInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let cols = parse_tabbed_line(line);
            if cols.len() < 4 {
                return None;
            }
            let vg_name = if cols[1].is_empty() {
                None
            } else {
                Some(cols[1].clone())
            };
            Some(PhysicalVolumeInfo {
                device: cols[0].clone(),
                vg_name,
                size: cols[2].parse().ok()?,
                free: cols[3].parse().ok()?,
            })
        })
        .collect()
}

/// Parse `df -h --output=source,fstype,size,used,avail,target`, keeping only
/// device-mapper backed rows. Suffixed sizes are normalized to bytes here
/// and never parsed again.
pub fn parse_df(output: &str) -> Result<Vec<FilesystemUsage>> {
    let mut filesystems = Vec::new();

    for line in output.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }
        let device = fields[0];
        if !device.starts_with("/dev/mapper/") {
            continue;
        }

        let size = parse_size(fields[2])
            .map_err(|e| SysError::parse("df", format!("size on line {line:?}: {e}")))?;
        let used = parse_size(fields[3])
            .map_err(|e| SysError::parse("df", format!("used on line {line:?}: {e}")))?;
        let available = parse_size(fields[4])
            .map_err(|e| SysError::parse("df", format!("avail on line {line:?}: {e}")))?;

        filesystems.push(FilesystemUsage {
            device: device.to_string(),
            kind: FsKind::from_fs_type(fields[1]),
            mount_point: fields[5].to_string(),
            total: size,
            used,
            available,
            write_rate: 0,
        });
    }

    Ok(filesystems)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn parses_lvm_outputs() {
        let vgs = parse_vgs("  vg0\t107374182400\t26843545600\t2\t3\n");
        let lvs = parse_lvs("  data\tvg0\t53687091200\t/dev/vg0/data\n");
        let pvs = parse_pvs("  /dev/sdb\tvg0\t107374182400\t26843545600\n  /dev/sdc\t\t42949672960\t42949672960\n");

        assert_eq!(vgs.len(), 1);
        assert_eq!(vgs[0].name, "vg0");
        assert_eq!(vgs[0].free, 25 * GIB);

        assert_eq!(lvs.len(), 1);
        assert_eq!(lvs[0].display_name(), "vg0/data");

        assert_eq!(pvs.len(), 2);
        assert_eq!(pvs[0].vg_name.as_deref(), Some("vg0"));
        assert!(pvs[1].vg_name.is_none());
    }

    #[test]
    fn skips_malformed_lvm_lines() {
        assert!(parse_vgs("vg0\tnot-a-number\t1\t1\t1\n").is_empty());
        assert!(parse_lvs("\n  \n").is_empty());
    }

    #[test]
    fn parses_df_keeping_mapper_rows_only() {
        let output = "\
Filesystem           Type  Size  Used Avail Mounted on
/dev/sda2            ext4   50G   20G   28G /
/dev/mapper/vg0-data ext4   50G 42,5G  7,5G /srv/data
tmpfs                tmpfs  16G     0   16G /tmp
/dev/mapper/vg0-logs xfs    10G  8.1G  1.9G /var/log/app
";
        let filesystems = parse_df(output).unwrap();
        assert_eq!(filesystems.len(), 2);

        let data = &filesystems[0];
        assert_eq!(data.lv_name(), "vg0-data");
        assert_eq!(data.kind, FsKind::Extent);
        assert_eq!(data.total, 50 * GIB);
        assert_eq!(data.used, 42 * GIB + GIB / 2);
        assert_eq!(data.usage_percent(), 85);

        let logs = &filesystems[1];
        assert_eq!(logs.kind, FsKind::Xfs);
        assert_eq!(logs.mount_point, "/var/log/app");
    }

    #[test]
    fn df_parse_error_names_the_line() {
        let output = "header\n/dev/mapper/vg0-bad ext4 oops 1G 1G /mnt\n";
        let err = parse_df(output).unwrap_err();
        assert!(err.to_string().contains("vg0-bad"));
    }
}
