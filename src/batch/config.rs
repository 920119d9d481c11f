use serde::{Deserialize, Serialize};

use crate::analyte::{MzWindowCoefficients, ReferenceTable};
use crate::spectrum::CalibrationSettings;
use crate::tables::{AlignmentDefaults, AnalyteDefaults};

/// S/N cut-off of calibrants when a window does not set one
pub const DEFAULT_CALIBRATION_SN_CUTOFF: f64 = 9.0;

/// Batch-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Half-width (s) of the alignment feature search window
    pub alignment_time_window: f64,
    /// Half-width (Th) of the EIC m/z slice
    pub alignment_mz_window: f64,
    pub alignment_sn_cutoff: f64,
    /// Minimum number of features for an alignment fit
    pub alignment_min_peaks: usize,
    /// Sum spectrum grid points per Th
    pub sum_spectrum_resolution: f64,
    /// Da
    pub background_mass_window: f64,
    /// Da
    pub calibration_mass_window: f64,
    /// Constant integration window (Th)
    pub quantitation_mz_window: f64,
    /// Use `quadratic_coefficients` instead of `quantitation_mz_window`
    pub quadratic_mz_window: bool,
    /// `(a, b, c)` of `a·mz² + b·mz + c`
    pub quadratic_coefficients: (f64, f64, f64),
    pub min_calibrant_number: usize,
    pub min_isotopic_fraction: f64,
    /// Block name of the charge carrier
    pub charge_carrier: String,
    /// Only quantify files written by alignment
    pub quantitate_aligned_only: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            alignment_time_window: 10.0,
            alignment_mz_window: 0.05,
            alignment_sn_cutoff: 9.0,
            alignment_min_peaks: 5,
            sum_spectrum_resolution: 100.0,
            background_mass_window: 10.0,
            calibration_mass_window: 0.5,
            quantitation_mz_window: 0.05,
            quadratic_mz_window: false,
            quadratic_coefficients: (0.0, 0.0, 0.05),
            min_calibrant_number: 4,
            min_isotopic_fraction: 0.95,
            charge_carrier: "proton".to_string(),
            quantitate_aligned_only: false,
        }
    }
}

impl BatchConfig {
    /// Integration window applied to analytes without their own
    pub fn mz_window(&self) -> MzWindowCoefficients {
        if self.quadratic_mz_window {
            let (a, b, c) = self.quadratic_coefficients;
            MzWindowCoefficients::quadratic(a, b, c)
        } else {
            MzWindowCoefficients::constant(self.quantitation_mz_window)
        }
    }

    pub fn analyte_defaults(&self) -> AnalyteDefaults {
        AnalyteDefaults {
            mz_window: self.mz_window(),
            min_isotopic_fraction: self.min_isotopic_fraction,
            charge_carrier: self.charge_carrier.clone(),
        }
    }

    pub fn alignment_defaults(&self) -> AlignmentDefaults {
        AlignmentDefaults {
            mz_window: self.alignment_mz_window,
            time_window: self.alignment_time_window,
            sn_cutoff: self.alignment_sn_cutoff,
        }
    }

    pub fn calibration_settings(&self, sn_cutoff: f64) -> CalibrationSettings {
        CalibrationSettings {
            background_mass_window: self.background_mass_window,
            calibration_mass_window: self.calibration_mass_window,
            min_calibrant_number: self.min_calibrant_number,
            sn_cutoff,
        }
    }

    /// `(setting, value)` pairs recorded next to the results
    pub fn settings_table(&self, start_stamp: &str) -> Vec<(String, String)> {
        let quadratic = if self.quadratic_mz_window {
            let (a, b, c) = self.quadratic_coefficients;
            format!("({}, {}, {})", a, b, c)
        } else {
            "N/A".to_string()
        };
        [
            ("mzquant version", env!("CARGO_PKG_VERSION").to_string()),
            ("Batch process start time", start_stamp.to_string()),
            ("Charge carrier", self.charge_carrier.clone()),
            ("Sum spectrum resolution", self.sum_spectrum_resolution.to_string()),
            ("Background mass window", self.background_mass_window.to_string()),
            ("Calibration mass window", self.calibration_mass_window.to_string()),
            ("Quantitation m/z window", self.quantitation_mz_window.to_string()),
            ("Min. calibrant number", self.min_calibrant_number.to_string()),
            ("Min. isotopic fraction", self.min_isotopic_fraction.to_string()),
            ("Quadratic m/z window", self.quadratic_mz_window.to_string()),
            ("Quadratic coefficients", quadratic),
            ("Alignment time window", self.alignment_time_window.to_string()),
            ("Alignment m/z window", self.alignment_mz_window.to_string()),
            ("Alignment S/N cutoff", self.alignment_sn_cutoff.to_string()),
            ("Alignment min. peaks", self.alignment_min_peaks.to_string()),
            ("Quantitate aligned only", self.quantitate_aligned_only.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Calibration setting of the sum spectrum at one retention time window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SumSpectrumSetting {
    pub time: f64,
    pub time_window: f64,
    #[serde(default)]
    pub calibrate: bool,
    #[serde(default = "default_sn_cutoff")]
    pub sn_cutoff: f64,
}

fn default_sn_cutoff() -> f64 {
    DEFAULT_CALIBRATION_SN_CUTOFF
}

/// One setting per retention time window of `reference`, in window order.
///
/// Windows missing from `configured` calibrate when they hold a calibrant.
/// Configured windows the reference does not contain are dropped.
pub fn resolve_sum_spectrum_settings(
    configured: &[SumSpectrumSetting],
    reference: &ReferenceTable,
) -> Vec<SumSpectrumSetting> {
    reference
        .windows()
        .into_iter()
        .map(|(time, time_window)| {
            configured
                .iter()
                .find(|s| s.time == time && s.time_window == time_window)
                .copied()
                .unwrap_or_else(|| SumSpectrumSetting {
                    time,
                    time_window,
                    calibrate: reference.in_window(time, time_window).any(|p| p.calibrant),
                    sn_cutoff: DEFAULT_CALIBRATION_SN_CUTOFF,
                })
        })
        .collect()
}
