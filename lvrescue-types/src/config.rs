//! Runtime configuration
//!
//! The fill threshold and donor ceiling are policy knobs, not literals:
//! everything here has a default and can be overridden from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RescueConfig {
    /// Usage percentage at which a filesystem becomes an extension candidate.
    pub fill_threshold_percent: u8,

    /// Usage percentage a donor may not exceed after giving up space.
    pub donor_ceiling_percent: u8,

    /// Forecast horizon for projected donor consumption, in seconds.
    pub forecast_horizon_secs: u64,

    /// How much to grow an undersized logical volume per decision.
    pub extend_step_bytes: u64,

    /// Wait before re-probing a busy mount point, in milliseconds.
    pub settle_delay_ms: u64,

    /// Hard bound on the extend -> reclaim -> extend cycle.
    pub max_extend_attempts: u32,

    /// The retry worker yields the lock after this many processed entries.
    pub worker_yield_every: u32,

    /// How long the retry worker sleeps while yielding, in seconds.
    pub worker_yield_sleep_secs: u64,

    /// Durable retry-queue file.
    pub queue_path: PathBuf,

    /// Advisory lock file.
    pub lock_path: PathBuf,

    /// Directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            fill_threshold_percent: 80,
            donor_ceiling_percent: 70,
            forecast_horizon_secs: 3600,
            extend_step_bytes: 1024 * 1024 * 1024,
            settle_delay_ms: 1000,
            max_extend_attempts: 3,
            worker_yield_every: 5,
            worker_yield_sleep_secs: 5,
            queue_path: PathBuf::from("/var/lib/lvrescue/queue"),
            lock_path: PathBuf::from("/var/lib/lvrescue/lock"),
            log_dir: PathBuf::from("/var/log/lvrescue"),
        }
    }
}

impl RescueConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fill_threshold_percent == 0 || self.fill_threshold_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "fill_threshold_percent must be in 1..=100, got {}",
                self.fill_threshold_percent
            )));
        }
        if self.donor_ceiling_percent >= self.fill_threshold_percent {
            return Err(ConfigError::Invalid(format!(
                "donor_ceiling_percent ({}) must stay below fill_threshold_percent ({})",
                self.donor_ceiling_percent, self.fill_threshold_percent
            )));
        }
        if self.extend_step_bytes == 0 {
            return Err(ConfigError::Invalid(
                "extend_step_bytes must be nonzero".to_string(),
            ));
        }
        if self.max_extend_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_extend_attempts must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
