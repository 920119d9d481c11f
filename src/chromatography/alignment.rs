//! Retention time alignment.
//!
//! Observed apex times of the alignment features are mapped onto their
//! required times with `required = a·observed^b + c`. When the power law does
//! not converge a straight line is fitted instead.

use log::{debug, warn};
use serde::Serialize;

use crate::mzxml::MzXmlRun;
use crate::numeric::stats::linspace;
use crate::numeric::{levenberg_marquardt, FitError, LmOptions, Polynomial};

use super::{AlignmentFeature, EicSummary};

/// Exponent range the power law is steered towards
const EXPONENT_MIN: f64 = 0.0;
const EXPONENT_MAX: f64 = 2.0;
const EXPONENT_PENALTY: f64 = 10_000.0;
/// Points on the fitted curve in a figure
const CURVE_POINTS: usize = 100;

/// Fitted transform from observed to aligned retention time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum AlignmentFit {
    /// `a·t^b + c`
    Power { a: f64, b: f64, c: f64 },
    /// `a·t + b`
    Linear { a: f64, b: f64 },
}

impl AlignmentFit {
    pub fn apply(&self, time: f64) -> f64 {
        match *self {
            AlignmentFit::Power { a, b, c } => a * time.powf(b) + c,
            AlignmentFit::Linear { a, b } => a * time + b,
        }
    }

    pub fn apply_all(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.apply(t)).collect()
    }

    pub fn coefficients(&self) -> Vec<f64> {
        match *self {
            AlignmentFit::Power { a, b, c } => vec![a, b, c],
            AlignmentFit::Linear { a, b } => vec![a, b],
        }
    }

    /// Legend text such as `Power fit: y = 1.02x^0.99 + 3.10`
    pub fn label(&self) -> String {
        match *self {
            AlignmentFit::Power { a, b, c } => {
                format!("Power fit: y = {:.2}x^{:.2} + {:.2}", a, b, c)
            }
            AlignmentFit::Linear { a, b } => format!("Linear fit: y = {:.2}x + {:.2}", a, b),
        }
    }
}

/// Power law with a penalty that keeps the exponent inside `[0, 2]`
pub fn penalized_power(x: f64, params: &[f64]) -> f64 {
    let (a, b, c) = (params[0], params[1], params[2]);
    let penalty = if b > EXPONENT_MAX {
        (b - 1.0).abs() * EXPONENT_PENALTY
    } else if b < EXPONENT_MIN {
        (2.0 - b).abs() * EXPONENT_PENALTY
    } else {
        0.0
    };
    a * x.powf(b) + c + penalty
}

/// Fit required times as a function of observed times.
///
/// # Errors
///
/// [`FitError::InsufficientPoints`] below `min_peaks` pairs, otherwise the
/// error of the linear fallback when both models fail.
pub fn fit_retention_alignment(
    observed: &[f64],
    required: &[f64],
    min_peaks: usize,
) -> Result<AlignmentFit, FitError> {
    if observed.len() < min_peaks {
        return Err(FitError::InsufficientPoints {
            required: min_peaks,
            actual: observed.len(),
        });
    }

    match levenberg_marquardt(
        observed,
        required,
        &[1.0, 1.0, 1.0],
        penalized_power,
        &LmOptions::default(),
    ) {
        Ok(fit) if fit.parameters.iter().all(|p| p.is_finite()) => {
            debug!(
                "Power alignment fit converged after {} iterations",
                fit.iterations
            );
            return Ok(AlignmentFit::Power {
                a: fit.parameters[0],
                b: fit.parameters[1],
                c: fit.parameters[2],
            });
        }
        Ok(_) => debug!("Power alignment fit produced non-finite parameters"),
        Err(e) => debug!("Power alignment fit failed: {}", e),
    }

    let line = Polynomial::fit(observed, required, 1)?;
    Ok(AlignmentFit::Linear {
        a: line.coefficients[0],
        b: line.coefficients[1],
    })
}

/// One feature that passed its S/N cut-off
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentPoint {
    pub mz: f64,
    pub required_time: f64,
    #[serde(flatten)]
    pub summary: EicSummary,
}

/// Features of `run` usable for fitting.
///
/// A feature contributes when its EIC S/N reaches its cut-off. When a
/// required feature misses the cut-off no features are returned at all.
pub fn select_alignment_points(
    run: &MzXmlRun,
    features: &[AlignmentFeature],
) -> Vec<AlignmentPoint> {
    let mut points = Vec::with_capacity(features.len());
    for feature in features {
        let summary = feature.extract_eic(run).summarize();
        if summary.signal_to_noise >= feature.sn_cutoff {
            points.push(AlignmentPoint {
                mz: feature.mz,
                required_time: feature.time,
                summary,
            });
        } else if feature.required {
            warn!(
                "Required alignment feature {:.4} Th at {} s below S/N cut-off in {}",
                feature.mz, feature.time, run.name
            );
            return Vec::new();
        } else {
            debug!(
                "Alignment feature {:.4} Th at {} s skipped in {} (S/N {:.2})",
                feature.mz, feature.time, run.name, summary.signal_to_noise
            );
        }
    }
    points
}

/// Outcome of aligning one run
#[derive(Debug, Clone)]
pub struct RunAlignment {
    pub name: String,
    pub points: Vec<AlignmentPoint>,
    /// `None` when fitting failed
    pub fit: Option<AlignmentFit>,
}

impl RunAlignment {
    pub fn observed_times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.summary.observed_time).collect()
    }

    pub fn required_times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.required_time).collect()
    }

    /// Diagnostic figure of a successful fit
    pub fn figure(&self) -> Option<AlignmentFigure> {
        let fit = self.fit?;
        let observed = self.observed_times();
        let low = observed.iter().copied().fold(f64::INFINITY, f64::min);
        let high = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let curve_x = linspace(low, high, CURVE_POINTS);
        Some(AlignmentFigure {
            title: self.name.clone(),
            label: fit.label(),
            coefficients: fit.coefficients(),
            adjusted: fit.apply_all(&observed),
            required: self.required_times(),
            curve_y: fit.apply_all(&curve_x),
            curve_x,
            observed,
        })
    }
}

/// Fit the alignment of `run` from its feature EICs
pub fn align_run(run: &MzXmlRun, features: &[AlignmentFeature], min_peaks: usize) -> RunAlignment {
    let points = select_alignment_points(run, features);
    let observed: Vec<f64> = points.iter().map(|p| p.summary.observed_time).collect();
    let required: Vec<f64> = points.iter().map(|p| p.required_time).collect();

    let fit = match fit_retention_alignment(&observed, &required, min_peaks) {
        Ok(fit) => Some(fit),
        Err(e) => {
            debug!("No alignment for {}: {}", run.name, e);
            None
        }
    };

    RunAlignment {
        name: run.name.clone(),
        points,
        fit,
    }
}

/// Observed vs required retention times with the fitted curve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentFigure {
    pub title: String,
    pub label: String,
    pub coefficients: Vec<f64>,
    pub observed: Vec<f64>,
    pub required: Vec<f64>,
    /// Observed times after applying the fit
    pub adjusted: Vec<f64>,
    pub curve_x: Vec<f64>,
    pub curve_y: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affine_transform_recovered() {
        let observed: Vec<f64> = (1..=8).map(|i| 100.0 * i as f64).collect();
        let required: Vec<f64> = observed.iter().map(|t| 2.0 * t + 5.0).collect();

        let fit = fit_retention_alignment(&observed, &required, 5).unwrap();
        for (&o, &r) in observed.iter().zip(required.iter()) {
            assert!((fit.apply(o) - r).abs() < 0.5, "{:?} at {}", fit, o);
        }
    }

    #[test]
    fn test_too_few_points() {
        let result = fit_retention_alignment(&[1.0, 2.0], &[3.0, 4.0], 5);
        assert!(matches!(
            result,
            Err(FitError::InsufficientPoints { required: 5, actual: 2 })
        ));
    }

    #[test]
    fn test_linear_fallback_on_two_points() {
        // Two points cannot support three power-law parameters
        let fit = fit_retention_alignment(&[10.0, 20.0], &[25.0, 45.0], 2).unwrap();
        match fit {
            AlignmentFit::Linear { a, b } => {
                assert!((a - 2.0).abs() < 1e-9);
                assert!((b - 5.0).abs() < 1e-9);
            }
            other => panic!("expected linear fit, got {:?}", other),
        }
    }

    #[test]
    fn test_penalty() {
        assert_eq!(penalized_power(2.0, &[1.0, 1.0, 0.0]), 2.0);
        assert!(penalized_power(2.0, &[1.0, 3.0, 0.0]) > 10_000.0);
        assert!(penalized_power(2.0, &[1.0, -1.0, 0.0]) > 10_000.0);
    }

    #[test]
    fn test_labels() {
        let power = AlignmentFit::Power { a: 1.0, b: 0.5, c: 2.0 };
        assert_eq!(power.label(), "Power fit: y = 1.00x^0.50 + 2.00");
        assert_eq!(power.coefficients(), vec![1.0, 0.5, 2.0]);
        assert_eq!(power.apply(4.0), 4.0);

        let linear = AlignmentFit::Linear { a: 2.0, b: 5.0 };
        assert_eq!(linear.label(), "Linear fit: y = 2.00x + 5.00");
        assert_eq!(linear.apply_all(&[1.0, 2.0]), vec![7.0, 9.0]);
    }
}
