//! # Spectra, isotopic peaks and calibration
//!
//! Sum spectra built from a retention time window, isotopic peak
//! integration with local background estimation, and the quadratic m/z
//! calibration of a sum spectrum against calibrant peaks.

mod calibrant;
mod error;
mod mass_spectrum;
mod peak;
mod sum_spectrum;

pub use calibrant::Calibrant;
pub use error::CalibrationError;
pub use mass_spectrum::{
    calibrate, Calibration, CalibrationFigure, CalibrationSettings, CalibrationStatus,
    CalibrantTarget, MassSpectrum,
};
pub use peak::{BackgroundNoise, IsotopicPeak, BACKGROUND_BINS};
pub use sum_spectrum::{create_sum_spectrum, SumSpectrum};

use std::io::Write;

use crate::numeric::stats::window_range;

/// Profile spectrum with ascending m/z
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl Spectrum {
    pub fn new(mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self { mz, intensity }
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Samples with m/z in `[low, high]`
    pub fn slice(&self, low: f64, high: f64) -> (&[f64], &[f64]) {
        let range = window_range(&self.mz, low, high);
        (&self.mz[range.clone()], &self.intensity[range])
    }

    /// Tab separated `m/z intensity` lines with 8 decimals
    pub fn write_xy<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for (mz, intensity) in self.mz.iter().zip(self.intensity.iter()) {
            writeln!(writer, "{:.8}\t{:.8}", mz, intensity)?;
        }
        writer.flush()
    }
}
