use serde::Serialize;

use crate::isotopes::c13_c12_mass_diff;
use crate::numeric::stats::{linspace, mean, sample_std, trapezoid};
use crate::numeric::CubicSpline;

use super::Spectrum;

/// Consecutive probe bins pooled into one background candidate
pub const BACKGROUND_BINS: usize = 5;
/// Spline evaluation points per Th
const SPLINE_GRID_DENSITY: f64 = 2500.0;
const MIN_SPLINE_GRID: usize = 10;

/// Local background of an isotopic peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackgroundNoise {
    /// Mean intensity of the pooled background samples
    pub intensity: f64,
    /// Mean area of the background bins
    pub area: f64,
    /// Sample standard deviation of the pooled background samples
    pub noise: f64,
}

impl BackgroundNoise {
    pub fn undefined() -> Self {
        Self {
            intensity: f64::NAN,
            area: f64::NAN,
            noise: f64::NAN,
        }
    }
}

/// One isotopic peak of an analyte in a spectrum
#[derive(Debug, Clone, Copy)]
pub struct IsotopicPeak<'a> {
    pub mz_exact: f64,
    pub charge: i32,
    pub integration_window: f64,
    spectrum: &'a Spectrum,
}

impl<'a> IsotopicPeak<'a> {
    pub fn new(mz_exact: f64, charge: i32, spectrum: &'a Spectrum, integration_window: f64) -> Self {
        Self {
            mz_exact,
            charge,
            integration_window,
            spectrum,
        }
    }

    pub fn spectrum(&self) -> &'a Spectrum {
        self.spectrum
    }

    /// Samples within `mz_exact ± integration_window`
    pub fn data(&self) -> (&'a [f64], &'a [f64]) {
        self.spectrum.slice(
            self.mz_exact - self.integration_window,
            self.mz_exact + self.integration_window,
        )
    }

    /// Trapezoidal area of the integration window
    pub fn area(&self) -> f64 {
        let (mz, intensity) = self.data();
        trapezoid(mz, intensity)
    }

    /// Highest intensity in the integration window, zero if it is empty
    pub fn maximum_intensity(&self) -> f64 {
        let (_, intensity) = self.data();
        intensity.iter().copied().fold(None, |acc: Option<f64>, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
        .unwrap_or(0.0)
    }

    fn charge_magnitude(&self) -> f64 {
        f64::from(self.charge.unsigned_abs().max(1))
    }

    /// Background around `target_mz` from isotope-spaced probe bins.
    ///
    /// Bin centres are `C13-C12` mass differences apart (divided by the
    /// charge) across `target_mz ± background_mass_window / z`; each bin
    /// spans the integration window. The run of five consecutive bins with
    /// the lowest mean intensity is the background.
    pub fn background_noise(&self, target_mz: f64, background_mass_window: f64) -> BackgroundNoise {
        let z = self.charge_magnitude();
        let spacing = c13_c12_mass_diff();
        // Steps of 1/z from -window/z to +window/z
        let steps = (2.0 * background_mass_window + 1e-9).floor().max(0.0) as usize + 1;
        let first = -background_mass_window / z;

        let bins: Vec<(f64, &[f64])> = (0..steps)
            .map(|i| {
                let step = first + i as f64 / z;
                let centre = target_mz + step * spacing;
                let (mz, intensity) = self.spectrum.slice(
                    centre - self.integration_window,
                    centre + self.integration_window,
                );
                (trapezoid(mz, intensity), intensity)
            })
            .collect();

        let mut best: Option<(f64, usize, Vec<f64>)> = None;
        for start in 0..bins.len().saturating_sub(BACKGROUND_BINS - 1) {
            let window = &bins[start..start + BACKGROUND_BINS];
            let pooled: Vec<f64> = window.iter().flat_map(|(_, i)| i.iter().copied()).collect();
            let average = mean(&pooled);
            let lower = match &best {
                Some((current, _, _)) => average < *current,
                None => !average.is_nan(),
            };
            if lower {
                best = Some((average, start, pooled));
            }
        }

        match best {
            Some((intensity, start, pooled)) => {
                let areas: Vec<f64> = bins[start..start + BACKGROUND_BINS]
                    .iter()
                    .map(|(area, _)| *area)
                    .collect();
                BackgroundNoise {
                    intensity,
                    area: mean(&areas),
                    noise: sample_std(&pooled),
                }
            }
            None => BackgroundNoise::undefined(),
        }
    }

    /// Apex `(m/z, intensity)` within `mz_exact ± mz_window`.
    ///
    /// A cubic spline through the samples is evaluated on a grid of
    /// `max(10, span·2500)` points, the product truncated toward zero. When
    /// the spline cannot be built the raw sample maximum is used. An empty
    /// window gives `(mz_exact, 0)`.
    pub fn spline_maximum(&self, mz_window: f64) -> (f64, f64) {
        let (mz, intensity) = self.spectrum.slice(self.mz_exact - mz_window, self.mz_exact + mz_window);
        if mz.is_empty() {
            return (self.mz_exact, 0.0);
        }

        let (low, high) = (mz[0], mz[mz.len() - 1]);
        let count = (((high - low) * SPLINE_GRID_DENSITY) as usize).max(MIN_SPLINE_GRID);
        let grid = linspace(low, high, count);
        let mut apex = (grid[grid.len() / 2], 0.0);

        match CubicSpline::not_a_knot(mz, intensity) {
            Ok(spline) => {
                for &x in &grid {
                    let predicted = spline.evaluate(x);
                    if predicted > apex.1 {
                        apex = (x, predicted);
                    }
                }
            }
            Err(_) => {
                for (&x, &y) in mz.iter().zip(intensity.iter()) {
                    if y > apex.1 {
                        apex = (x, y);
                    }
                }
            }
        }
        apex
    }

    /// `(observed - exact) / exact · 1e6` with the apex of the integration window.
    ///
    /// NaN when the integration window holds no samples.
    pub fn mass_error_ppm(&self) -> f64 {
        if self.data().0.is_empty() {
            return f64::NAN;
        }
        let (observed, _) = self.spline_maximum(self.integration_window);
        (observed - self.mz_exact) / self.mz_exact * 1e6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gaussian peaks on a flat baseline, sampled every 0.002 Th
    fn spectrum(peaks: &[(f64, f64)], baseline: f64, from: f64, to: f64) -> Spectrum {
        let count = ((to - from) / 0.002) as usize + 1;
        let mz = linspace(from, to, count);
        let intensity = mz
            .iter()
            .map(|&x| {
                baseline
                    + peaks
                        .iter()
                        .map(|&(centre, height)| height * (-((x - centre) / 0.01).powi(2) / 2.0).exp())
                        .sum::<f64>()
            })
            .collect();
        Spectrum::new(mz, intensity)
    }

    #[test]
    fn test_area_and_maximum() {
        let s = Spectrum::new(vec![99.9, 100.0, 100.1, 100.2], vec![0.0, 10.0, 0.0, 50.0]);
        let peak = IsotopicPeak::new(100.0, 1, &s, 0.15);
        assert!((peak.area() - 1.0).abs() < 1e-9);
        assert_eq!(peak.maximum_intensity(), 10.0);

        let empty = IsotopicPeak::new(500.0, 1, &s, 0.1);
        assert_eq!(empty.area(), 0.0);
        assert_eq!(empty.maximum_intensity(), 0.0);
        assert!(empty.mass_error_ppm().is_nan());
    }

    #[test]
    fn test_spline_apex_between_samples() {
        let s = spectrum(&[(500.0031, 1000.0)], 0.0, 499.9, 500.1);
        let peak = IsotopicPeak::new(500.0, 1, &s, 0.05);
        let (mz, intensity) = peak.spline_maximum(0.05);
        assert!((mz - 500.0031).abs() < 5e-4, "apex at {}", mz);
        assert!((intensity - 1000.0).abs() < 10.0);
        let ppm = peak.mass_error_ppm();
        assert!((ppm - 6.2).abs() < 1.0, "ppm {}", ppm);
    }

    #[test]
    fn test_spline_fallback_to_raw_maximum() {
        let s = Spectrum::new(vec![100.0, 100.01], vec![3.0, 8.0]);
        let peak = IsotopicPeak::new(100.0, 1, &s, 0.05);
        assert_eq!(peak.spline_maximum(0.05), (100.01, 8.0));
        let outside = IsotopicPeak::new(200.0, 1, &s, 0.05);
        assert_eq!(outside.spline_maximum(0.05), (200.0, 0.0));
    }

    #[test]
    fn test_background_prefers_quiet_bins() {
        // Isotope peaks at 1000 + k·1.00335 for k = 0..3 on a baseline of 10
        let spacing = c13_c12_mass_diff();
        let peaks: Vec<(f64, f64)> = (0..4).map(|k| (1000.0 + k as f64 * spacing, 5000.0)).collect();
        let s = spectrum(&peaks, 10.0, 989.0, 1011.0);
        let peak = IsotopicPeak::new(1000.0, 1, &s, 0.02);
        let background = peak.background_noise(1000.0, 10.0);
        assert!((background.intensity - 10.0).abs() < 1e-6);
        assert!(background.area > 0.35 && background.area < 0.41);
        assert!(background.noise < 1e-6);
    }

    #[test]
    fn test_background_charge_two_spacing() {
        let s = spectrum(&[], 3.0, 490.0, 510.0);
        let peak = IsotopicPeak::new(500.0, 2, &s, 0.01);
        let background = peak.background_noise(500.0, 10.0);
        assert!((background.intensity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_background_without_samples() {
        let s = Spectrum::new(vec![1.0], vec![1.0]);
        let peak = IsotopicPeak::new(500.0, 1, &s, 0.01);
        assert!(peak.background_noise(500.0, 10.0).intensity.is_nan());
    }
}
