use log::debug;
use serde::Serialize;

use crate::analyte::{validate_order, AnalyteError, ReferencePeak, ReferenceTable};
use crate::spectrum::{BackgroundNoise, IsotopicPeak, MassSpectrum, Spectrum};

/// Integration result of one isotopic peak
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakMeasurement {
    pub peak: String,
    pub mz_exact: f64,
    pub relative_area_theoretical: f64,
    pub area: f64,
    pub maximum_intensity: f64,
    pub mass_error_ppm: f64,
}

/// Measured isotopic peaks of an analyte in one charge state
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyteQuantitation {
    pub name: String,
    pub charge: i32,
    /// Peaks in isotopologue order
    pub peaks: Vec<PeakMeasurement>,
    /// Background of the first (lowest) isotopic peak
    pub background: BackgroundNoise,
}

/// Summary metrics of an [`AnalyteQuantitation`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalyteMetrics {
    pub mz_monoisotopic: f64,
    pub isotopic_fraction: f64,
    pub mass_error_ppm: f64,
    pub total_area: f64,
    pub total_background: f64,
    pub total_noise: f64,
    pub total_area_background_subtracted: f64,
    pub signal_to_noise: f64,
    /// `None` when nothing remains after background subtraction
    pub isotopic_pattern_quality: Option<f64>,
}

fn positive_or_zero(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

impl AnalyteQuantitation {
    /// Peak with the highest theoretical relative area (first on ties)
    fn most_abundant(&self) -> Option<&PeakMeasurement> {
        self.peaks.iter().fold(None, |best: Option<&PeakMeasurement>, p| match best {
            Some(b) if p.relative_area_theoretical <= b.relative_area_theoretical => Some(b),
            _ => Some(p),
        })
    }

    pub fn isotopic_fraction(&self) -> f64 {
        self.peaks.iter().map(|p| p.relative_area_theoretical).sum()
    }

    pub fn total_area(&self) -> f64 {
        positive_or_zero(self.peaks.iter().map(|p| p.area).sum())
    }

    pub fn total_background(&self) -> f64 {
        positive_or_zero(self.background.area * self.peaks.len() as f64)
    }

    pub fn total_noise(&self) -> f64 {
        positive_or_zero(self.background.noise * self.peaks.len() as f64)
    }

    /// Sum of the positive background-subtracted peak areas
    pub fn total_area_background_subtracted(&self) -> f64 {
        let sum = self
            .peaks
            .iter()
            .map(|p| p.area - self.background.area)
            .filter(|&a| a > 0.0)
            .sum();
        positive_or_zero(sum)
    }

    /// S/N of the most abundant isotopic peak, zero when not positive
    pub fn signal_to_noise(&self) -> f64 {
        self.most_abundant()
            .map(|p| positive_or_zero((p.maximum_intensity - self.background.intensity) / self.background.noise))
            .unwrap_or(0.0)
    }

    pub fn mass_error_ppm(&self) -> f64 {
        self.most_abundant().map(|p| p.mass_error_ppm).unwrap_or(f64::NAN)
    }

    /// Summed absolute difference between observed and theoretical relative areas.
    ///
    /// Theoretical areas are renormalised over the integrated peaks.
    pub fn isotopic_pattern_quality(&self) -> Option<f64> {
        let total = self.total_area_background_subtracted();
        if total == 0.0 {
            return None;
        }
        let fraction = self.isotopic_fraction();
        let ipq = self
            .peaks
            .iter()
            .map(|p| {
                let observed = positive_or_zero(p.area - self.background.area) / total;
                (observed - p.relative_area_theoretical / fraction).abs()
            })
            .sum();
        Some(ipq)
    }

    pub fn metrics(&self) -> AnalyteMetrics {
        AnalyteMetrics {
            mz_monoisotopic: self.peaks.first().map(|p| p.mz_exact).unwrap_or(f64::NAN),
            isotopic_fraction: self.isotopic_fraction(),
            mass_error_ppm: self.mass_error_ppm(),
            total_area: self.total_area(),
            total_background: self.total_background(),
            total_noise: self.total_noise(),
            total_area_background_subtracted: self.total_area_background_subtracted(),
            signal_to_noise: self.signal_to_noise(),
            isotopic_pattern_quality: self.isotopic_pattern_quality(),
        }
    }
}

/// Measure consecutive reference rows of each `(analyte, charge)` in `spectrum`.
///
/// The background of an analyte is taken at its first row and reused for
/// the rest of its peaks. Rows must already be grouped.
pub fn quantify_rows<'a, I>(
    spectrum: &Spectrum,
    rows: I,
    background_mass_window: f64,
) -> Vec<AnalyteQuantitation>
where
    I: IntoIterator<Item = &'a ReferencePeak>,
{
    let mut analytes: Vec<AnalyteQuantitation> = Vec::new();
    for row in rows {
        let peak = IsotopicPeak::new(row.mz, row.charge, spectrum, row.mz_window);
        let continues = analytes
            .last()
            .map(|a| a.name == row.analyte && a.charge == row.charge)
            .unwrap_or(false);
        if !continues {
            analytes.push(AnalyteQuantitation {
                name: row.analyte.clone(),
                charge: row.charge,
                peaks: Vec::new(),
                background: peak.background_noise(peak.mz_exact, background_mass_window),
            });
        }
        if let Some(current) = analytes.last_mut() {
            current.peaks.push(PeakMeasurement {
                peak: row.peak.clone(),
                mz_exact: row.mz,
                relative_area_theoretical: row.relative_area,
                area: peak.area(),
                maximum_intensity: peak.maximum_intensity(),
                mass_error_ppm: peak.mass_error_ppm(),
            });
        }
    }
    analytes
}

/// Quantify every analyte of the spectrum's retention time window.
///
/// Returns `Ok(None)` when calibration was requested but failed.
///
/// # Errors
///
/// [`AnalyteError::UnsortedReference`] when the window's rows are not grouped
/// by analyte and charge with ascending isotopologues.
pub fn quantify(
    spectrum: &MassSpectrum,
    reference: &ReferenceTable,
    background_mass_window: f64,
) -> Result<Option<Vec<AnalyteQuantitation>>, AnalyteError> {
    let Some(data) = spectrum.quantitation_spectrum() else {
        debug!("Skipping quantitation of uncalibrated {}", spectrum.name);
        return Ok(None);
    };

    let rows: Vec<&ReferencePeak> = match (spectrum.time, spectrum.time_window) {
        (Some(time), Some(window)) => reference.in_window(time, window).collect(),
        _ => reference.peaks().iter().collect(),
    };
    validate_order(rows.iter().copied())?;

    Ok(Some(quantify_rows(data, rows, background_mass_window)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(relative: f64, area: f64, max: f64) -> PeakMeasurement {
        PeakMeasurement {
            peak: "x".to_string(),
            mz_exact: 500.0,
            relative_area_theoretical: relative,
            area,
            maximum_intensity: max,
            mass_error_ppm: relative * 10.0,
        }
    }

    fn analyte(peaks: Vec<PeakMeasurement>, area: f64, intensity: f64, noise: f64) -> AnalyteQuantitation {
        AnalyteQuantitation {
            name: "H5N4".to_string(),
            charge: 2,
            peaks,
            background: BackgroundNoise { intensity, area, noise },
        }
    }

    #[test]
    fn test_metrics() {
        let a = analyte(
            vec![measurement(0.5, 60.0, 300.0), measurement(0.3, 40.0, 200.0)],
            10.0,
            20.0,
            4.0,
        );
        let m = a.metrics();
        assert!((m.isotopic_fraction - 0.8).abs() < 1e-12);
        assert_eq!(m.total_area, 100.0);
        assert_eq!(m.total_background, 20.0);
        assert_eq!(m.total_noise, 8.0);
        assert_eq!(m.total_area_background_subtracted, 80.0);
        assert_eq!(m.signal_to_noise, 70.0);
        assert_eq!(m.mass_error_ppm, 5.0);
        // observed 50/80, 30/80; theoretical 0.625, 0.375
        assert!(m.isotopic_pattern_quality.unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_areas_below_background() {
        let a = analyte(vec![measurement(0.6, 5.0, 10.0), measurement(0.4, 3.0, 8.0)], 10.0, 20.0, 4.0);
        let m = a.metrics();
        assert_eq!(m.total_area_background_subtracted, 0.0);
        assert!(m.isotopic_pattern_quality.is_none());
        assert_eq!(m.signal_to_noise, 0.0);
    }

    #[test]
    fn test_undefined_background() {
        let a = analyte(vec![measurement(1.0, 5.0, 10.0)], f64::NAN, f64::NAN, f64::NAN);
        let m = a.metrics();
        assert_eq!(m.total_background, 0.0);
        assert_eq!(m.total_noise, 0.0);
        assert_eq!(m.total_area_background_subtracted, 0.0);
        assert_eq!(m.signal_to_noise, 0.0);
    }

    #[test]
    fn test_zero_noise_gives_infinite_signal_to_noise() {
        let a = analyte(vec![measurement(1.0, 50.0, 100.0)], 0.0, 10.0, 0.0);
        assert!(a.signal_to_noise().is_infinite());
    }
}
