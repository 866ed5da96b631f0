// SPDX-License-Identifier: GPL-3.0-only

//! lvrescue - keeps LVM-backed filesystems out of disk-full territory
//!
//! `scan` services everything over the fill threshold right now, `worker`
//! drains the queue of candidates that were busy when a scan found them,
//! and `report` prints the current inventory without touching anything.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use lvrescue_engine::{run_scan, run_worker};
use lvrescue_sys::HostSystem;
use lvrescue_types::{format_size, InventorySnapshot, RescueConfig};

const DEFAULT_CONFIG_PATH: &str = "/etc/lvrescue/config.toml";

#[derive(Parser)]
#[command(name = "lvrescue", version, about = "LVM capacity rebalancer")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log the commands that would run without executing them.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extend every filesystem at or above the fill threshold.
    Scan,
    /// Drain the retry queue of filesystems that were busy during a scan.
    Worker,
    /// Print the current volume and filesystem inventory.
    Report {
        /// Emit the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let _log_guard = init_logging(&config.log_dir);

    tracing::info!("lvrescue v{}", env!("CARGO_PKG_VERSION"));

    lvrescue_sys::require_lvm_tools()?;
    let host = HostSystem::new(cli.dry_run, Duration::from_millis(config.settle_delay_ms));

    match cli.command {
        Command::Scan => {
            ensure_root(cli.dry_run)?;
            let report = run_scan(&host, &config)?;
            if report.skipped {
                return Ok(());
            }
            tracing::info!(
                extended = report.extended.len(),
                queued = report.queued.len(),
                failed = report.failed.len(),
                unsatisfiable = report.unsatisfiable.len(),
                "scan pass complete"
            );
            if !report.unsatisfiable.is_empty() {
                anyhow::bail!(
                    "no space could be found for: {}",
                    report.unsatisfiable.join(", ")
                );
            }
        }
        Command::Worker => {
            ensure_root(cli.dry_run)?;
            let report = run_worker(&host, &config)?;
            if report.skipped {
                return Ok(());
            }
            tracing::info!(
                extended = report.extended,
                dropped = report.dropped,
                kept = report.kept,
                "worker pass complete"
            );
        }
        Command::Report { json } => {
            let snapshot = host.collect_inventory()?;
            if json {
                print_json_report(&snapshot, &config)?;
            } else {
                print_report(&snapshot, &config);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RescueConfig> {
    match path {
        Some(path) => RescueConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                RescueConfig::load(default)
                    .with_context(|| format!("loading config from {DEFAULT_CONFIG_PATH}"))
            } else {
                Ok(RescueConfig::default())
            }
        }
    }
}

/// Logs to stderr always, and additionally to a daily-rolled file when the
/// log directory is writable. Returns the appender guard so buffered lines
/// flush on exit.
fn init_logging(log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,lvrescue_cli=info,lvrescue_engine=info,lvrescue_sys=info")
    });
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, "lvrescue.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        Err(error) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            tracing::warn!(dir = %log_dir.display(), %error, "log directory unavailable, logging to stderr only");
            None
        }
    }
}

fn ensure_root(dry_run: bool) -> Result<()> {
    if dry_run {
        return Ok(());
    }
    if unsafe { libc::geteuid() } != 0 {
        anyhow::bail!("volume operations require root privileges");
    }
    Ok(())
}

fn print_report(snapshot: &InventorySnapshot, config: &RescueConfig) {
    for vg in &snapshot.volume_groups {
        println!(
            "VG {}: {} total, {} free, {} LVs, {} PVs",
            vg.name,
            format_size(vg.size),
            format_size(vg.free),
            vg.lv_count,
            vg.pv_count
        );
    }

    for fs in &snapshot.filesystems {
        let flag = if fs.usage_percent() >= config.fill_threshold_percent as u32 {
            " OVER THRESHOLD"
        } else {
            ""
        };
        println!(
            "  {} {} {} {}/{} ({}%) {}/s written{}",
            fs.mount_point,
            fs.kind,
            fs.device,
            format_size(fs.used),
            format_size(fs.total),
            fs.usage_percent(),
            format_size(fs.write_rate),
            flag
        );
    }

    for orphan in snapshot.orphaned_lvs() {
        println!(
            "  orphaned LV {} ({})",
            orphan.display_name(),
            format_size(orphan.size)
        );
    }
    for pv in snapshot.unattached_pvs() {
        println!("  unattached PV {} ({})", pv.device, format_size(pv.size));
    }
}

fn print_json_report(snapshot: &InventorySnapshot, config: &RescueConfig) -> Result<()> {
    let filesystems: Vec<serde_json::Value> = snapshot
        .filesystems
        .iter()
        .map(|fs| {
            serde_json::json!({
                "mount_point": fs.mount_point,
                "device": fs.device,
                "kind": fs.kind,
                "total_bytes": fs.total,
                "used_bytes": fs.used,
                "available_bytes": fs.available,
                "usage_percent": fs.usage_percent(),
                "write_rate_bytes_per_sec": fs.write_rate,
                "over_threshold": fs.usage_percent() >= config.fill_threshold_percent as u32,
            })
        })
        .collect();

    let report = serde_json::json!({
        "volume_groups": snapshot.volume_groups,
        "filesystems": filesystems,
        "orphaned_lvs": snapshot.orphaned_lvs(),
        "unattached_pvs": snapshot.unattached_pvs(),
        "fill_threshold_percent": config.fill_threshold_percent,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
