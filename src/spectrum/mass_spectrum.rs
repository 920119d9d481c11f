use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::numeric::stats::linspace;
use crate::numeric::Polynomial;

use super::{Calibrant, CalibrationError, Spectrum, SumSpectrum};

const CALIBRATION_DEGREE: usize = 2;
const CURVE_POINTS: usize = 100;

/// Expected calibrant peak: exact m/z, charge and integration window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrantTarget {
    pub mz: f64,
    pub charge: i32,
    pub mz_window: f64,
}

/// Settings shared by every calibration of a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSettings {
    /// Mass window (Da) of the background probe bins
    pub background_mass_window: f64,
    /// Mass window (Da) of the calibrant apex search
    pub calibration_mass_window: f64,
    pub min_calibrant_number: usize,
    /// Calibrants must exceed `background + sn_cutoff·noise`
    pub sn_cutoff: f64,
}

/// Quadratic observed→exact m/z mapping and the calibrants behind it
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub polynomial: Polynomial,
    pub mz_observed: Vec<f64>,
    pub mz_exact: Vec<f64>,
}

impl Calibration {
    pub fn apply(&self, spectrum: &Spectrum) -> Spectrum {
        Spectrum::new(
            spectrum.mz.iter().map(|&mz| self.polynomial.evaluate(mz)).collect(),
            spectrum.intensity.clone(),
        )
    }

    /// Legend text `Fit: y = ax^2 + bx + c` with three decimals
    pub fn label(&self) -> String {
        let c = &self.polynomial.coefficients;
        format!("Fit: y = {:.3}x^2 + {:.3}x + {:.3}", c[0], c[1], c[2])
    }

    pub fn figure(&self, title: &str) -> CalibrationFigure {
        let low = self.mz_observed.iter().copied().fold(f64::INFINITY, f64::min);
        let high = self.mz_observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let curve_x = linspace(low, high, CURVE_POINTS);
        CalibrationFigure {
            title: title.to_string(),
            label: self.label(),
            coefficients: self.polynomial.coefficients.clone(),
            observed: self.mz_observed.clone(),
            exact: self.mz_exact.clone(),
            adjusted: self
                .mz_observed
                .iter()
                .map(|&mz| self.polynomial.evaluate(mz))
                .collect(),
            curve_y: curve_x.iter().map(|&x| self.polynomial.evaluate(x)).collect(),
            curve_x,
        }
    }
}

/// Observed vs exact calibrant m/z with the fitted curve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationFigure {
    pub title: String,
    pub label: String,
    pub coefficients: Vec<f64>,
    pub observed: Vec<f64>,
    pub exact: Vec<f64>,
    pub adjusted: Vec<f64>,
    pub curve_x: Vec<f64>,
    pub curve_y: Vec<f64>,
}

/// Fit a quadratic calibration for `spectrum`.
///
/// Each calibrant's apex is located over the calibration window; it is used
/// when the apex clears `background + sn_cutoff·noise` measured at the apex.
///
/// # Errors
///
/// [`CalibrationError::NoCalibrants`] for an empty target list,
/// [`CalibrationError::TooFewCalibrants`] below `min_calibrant_number`
/// surviving calibrants, [`CalibrationError::Fit`] when the polynomial fit fails.
pub fn calibrate(
    spectrum: &Spectrum,
    targets: &[CalibrantTarget],
    settings: &CalibrationSettings,
) -> Result<Calibration, CalibrationError> {
    if targets.is_empty() {
        return Err(CalibrationError::NoCalibrants);
    }

    let passing: Vec<Calibrant> = targets
        .iter()
        .map(|t| {
            Calibrant::new(
                t.mz,
                t.charge,
                spectrum,
                t.mz_window,
                settings.calibration_mass_window,
            )
        })
        .filter(|c| c.passes_cutoff(settings.background_mass_window, settings.sn_cutoff))
        .collect();

    if passing.len() < settings.min_calibrant_number {
        return Err(CalibrationError::TooFewCalibrants {
            found: passing.len(),
            required: settings.min_calibrant_number,
        });
    }

    let mz_observed: Vec<f64> = passing.iter().map(|c| c.mz_observed).collect();
    let mz_exact: Vec<f64> = passing.iter().map(|c| c.mz_exact()).collect();
    let polynomial = Polynomial::fit(&mz_observed, &mz_exact, CALIBRATION_DEGREE)?;

    Ok(Calibration {
        polynomial,
        mz_observed,
        mz_exact,
    })
}

/// Outcome of calibrating a spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// No calibrants requested; the raw spectrum is used
    Skipped,
    Calibrated,
    /// Calibrants were requested but calibration failed
    Failed,
}

/// A sum spectrum together with its calibration
#[derive(Debug, Clone)]
pub struct MassSpectrum {
    pub name: String,
    pub file: String,
    pub time: Option<f64>,
    pub time_window: Option<f64>,
    pub uncalibrated: Spectrum,
    pub calibrated: Option<Spectrum>,
    pub calibration: Option<Calibration>,
    pub status: CalibrationStatus,
}

impl MassSpectrum {
    /// Calibrate a sum spectrum against `targets` (none skips calibration)
    pub fn from_sum_spectrum(
        sum: SumSpectrum,
        targets: &[CalibrantTarget],
        settings: &CalibrationSettings,
    ) -> Self {
        let name = sum.name();
        let mut spectrum = Self::uncalibrated(
            name,
            sum.file,
            Some(sum.time),
            Some(sum.time_window),
            sum.spectrum,
        );

        match calibrate(&spectrum.uncalibrated, targets, settings) {
            Ok(calibration) => {
                spectrum.calibrated = Some(calibration.apply(&spectrum.uncalibrated));
                spectrum.calibration = Some(calibration);
                spectrum.status = CalibrationStatus::Calibrated;
            }
            Err(CalibrationError::NoCalibrants) => {}
            Err(e) => {
                debug!("Calibration of {} failed: {}", spectrum.name, e);
                spectrum.status = CalibrationStatus::Failed;
            }
        }
        spectrum
    }

    /// Wrap a spectrum without calibrating it
    pub fn uncalibrated(
        name: String,
        file: String,
        time: Option<f64>,
        time_window: Option<f64>,
        spectrum: Spectrum,
    ) -> Self {
        Self {
            name,
            file,
            time,
            time_window,
            uncalibrated: spectrum,
            calibrated: None,
            calibration: None,
            status: CalibrationStatus::Skipped,
        }
    }

    /// Spectrum to quantify: calibrated if possible, raw when calibration was
    /// skipped, `None` when requested calibration failed
    pub fn quantitation_spectrum(&self) -> Option<&Spectrum> {
        match self.status {
            CalibrationStatus::Calibrated => self.calibrated.as_ref(),
            CalibrationStatus::Skipped => Some(&self.uncalibrated),
            CalibrationStatus::Failed => None,
        }
    }

    pub fn calibration_figure(&self) -> Option<CalibrationFigure> {
        self.calibration.as_ref().map(|c| c.figure(&self.name))
    }

    /// Write `calibrated_<name>.xy` or `uncalibrated_<name>.xy` into `dir`
    pub fn write_xy<P: AsRef<Path>>(&self, dir: P) -> std::io::Result<PathBuf> {
        let (prefix, spectrum) = match &self.calibrated {
            Some(calibrated) => ("calibrated", calibrated),
            None => ("uncalibrated", &self.uncalibrated),
        };
        let path = dir.as_ref().join(format!("{}_{}.xy", prefix, self.name));
        spectrum.write_xy(BufWriter::new(File::create(&path)?))?;
        Ok(path)
    }
}
