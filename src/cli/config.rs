//! TOML configuration file support.
//!
//! Batch settings and per-window calibration can be kept in a file instead
//! of being passed as flags:
//!
//! ```toml
//! # mzquant.toml
//! [batch]
//! alignment_min_peaks = 4
//! sum_spectrum_resolution = 200
//! quadratic_mz_window = true
//! quadratic_coefficients = [1e-8, 0.0, 0.02]
//! charge_carrier = "sodium"
//!
//! [[sum_spectrum]]
//! time = 300
//! time_window = 20
//! calibrate = true
//! sn_cutoff = 6
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use mzquant::batch::{BatchConfig, SumSpectrumSetting};

/// Root configuration structure for mzquant.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Batch-level settings; missing keys keep their defaults.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Calibration settings per retention time window.
    #[serde(default)]
    pub sum_spectrum: Vec<SumSpectrumSetting>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Configuration from `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
