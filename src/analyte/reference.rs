use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::blocks::BlockSet;

use super::composition::{monoisotopic_mass, variable_composition, Composition};
use super::isotopologues::{isotopologues, Isotopologue};
use super::AnalyteError;

/// Integration window as a quadratic function of m/z: `a·mz² + b·mz + c`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MzWindowCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl MzWindowCoefficients {
    pub fn constant(window: f64) -> Self {
        Self {
            a: 0.0,
            b: 0.0,
            c: window,
        }
    }

    pub fn quadratic(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn evaluate(&self, mz: f64) -> f64 {
        self.a * mz * mz + self.b * mz + self.c
    }
}

/// Everything needed to compute the reference peaks of one analyte
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyteSpec {
    /// Block composition such as `H5N4F1`
    pub name: String,
    pub charge_min: i32,
    pub charge_max: i32,
    pub mz_window: MzWindowCoefficients,
    /// Retention time (s) of the sum spectrum holding this analyte
    pub time: Option<f64>,
    pub time_window: Option<f64>,
    pub calibrant: bool,
    pub min_isotopic_fraction: f64,
    /// Block name of the charge carrier
    pub charge_carrier: String,
}

impl AnalyteSpec {
    /// Chromatographic analytes carry both a retention time and a window
    pub fn is_chromatographic(&self) -> bool {
        self.time.is_some() && self.time_window.is_some()
    }
}

/// One expected peak: analyte × charge × isotopologue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePeak {
    /// `{analyte}_{charge}_{isotopologue}`
    pub peak: String,
    pub analyte: String,
    pub charge: i32,
    pub isotopologue: usize,
    pub charge_carrier: String,
    /// Theoretical m/z
    pub mz: f64,
    /// Theoretical relative area (isotopologue probability)
    pub relative_area: f64,
    /// Integration half-window (Th)
    pub mz_window: f64,
    pub time: Option<f64>,
    pub time_window: Option<f64>,
    pub calibrant: bool,
}

impl ReferencePeak {
    /// Whether this row belongs to the sum spectrum at `(time, time_window)`
    pub fn in_window(&self, time: f64, time_window: f64) -> bool {
        self.time == Some(time) && self.time_window == Some(time_window)
    }
}

/// Reference peaks of `spec` for the given isotopologue ladder.
///
/// Charges run from `charge_min` to `charge_max` in steps of the carrier's
/// charge magnitude. Only the most probable isotopologue of a calibrant is
/// flagged. Analytes without a retention time produce no rows.
pub fn reference_rows(
    spec: &AnalyteSpec,
    isotopologues: &[Isotopologue],
    blocks: &BlockSet,
) -> Result<Vec<ReferencePeak>, AnalyteError> {
    let carrier = blocks
        .get(&spec.charge_carrier)
        .ok_or_else(|| AnalyteError::MissingChargeCarrier(spec.charge_carrier.clone()))?;
    let charge_unit = match carrier.charge {
        Some(c) if c != 0 => c,
        _ => {
            return Err(AnalyteError::InvalidCharge {
                analyte: spec.name.clone(),
                reason: format!("'{}' carries no charge", carrier.name),
            })
        }
    };
    if spec.charge_min > spec.charge_max {
        return Err(AnalyteError::InvalidCharge {
            analyte: spec.name.clone(),
            reason: format!(
                "minimum charge {} exceeds maximum charge {}",
                spec.charge_min, spec.charge_max
            ),
        });
    }
    if spec.charge_min <= 0 && spec.charge_max >= 0 {
        return Err(AnalyteError::InvalidCharge {
            analyte: spec.name.clone(),
            reason: "charge range includes zero".to_string(),
        });
    }

    let (Some(time), Some(time_window)) = (spec.time, spec.time_window) else {
        warn!(
            "Analyte '{}' has no retention time; non-chromatographic analytes produce no reference peaks",
            spec.name
        );
        return Ok(Vec::new());
    };

    let calibrant_index = if spec.calibrant {
        isotopologues
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, iso)| match best {
                Some((_, p)) if iso.probability <= p => best,
                _ => Some((i, iso.probability)),
            })
            .map(|(i, _)| i)
    } else {
        None
    };

    let step = charge_unit.unsigned_abs() as usize;
    let mut rows = Vec::new();
    for charge in (spec.charge_min..=spec.charge_max).step_by(step) {
        let carriers = charge as f64 / charge_unit as f64;
        for (i, iso) in isotopologues.iter().enumerate() {
            let mz = (iso.mass + carriers * carrier.mass) / (charge as f64).abs();
            rows.push(ReferencePeak {
                peak: format!("{}_{}_{}", spec.name, charge, iso.index),
                analyte: spec.name.clone(),
                charge,
                isotopologue: iso.index,
                charge_carrier: spec.charge_carrier.clone(),
                mz,
                relative_area: iso.probability,
                mz_window: spec.mz_window.evaluate(mz),
                time: Some(time),
                time_window: Some(time_window),
                calibrant: calibrant_index == Some(i),
            });
        }
    }
    Ok(rows)
}

/// Monoisotopic mass, composition, ladder and reference rows of one analyte
#[derive(Debug, Clone)]
pub struct AnalyteReference {
    pub spec: AnalyteSpec,
    pub monoisotopic_mass: f64,
    pub composition: Composition,
    pub isotopologues: Vec<Isotopologue>,
    pub peaks: Vec<ReferencePeak>,
}

impl AnalyteReference {
    pub fn build(spec: AnalyteSpec, blocks: &BlockSet) -> Result<Self, AnalyteError> {
        let monoisotopic_mass = monoisotopic_mass(&spec.name, blocks)?;
        let composition = variable_composition(&spec.name, blocks)?;
        let isotopologues = isotopologues(monoisotopic_mass, &composition, spec.min_isotopic_fraction);
        let peaks = reference_rows(&spec, &isotopologues, blocks)?;
        debug!(
            "Analyte '{}': {:.5} Da, {} isotopologues, {} reference peaks",
            spec.name,
            monoisotopic_mass,
            isotopologues.len(),
            peaks.len()
        );
        Ok(Self {
            spec,
            monoisotopic_mass,
            composition,
            isotopologues,
            peaks,
        })
    }
}

/// Check that rows of each `(analyte, charge)` are contiguous with ascending isotopologues
pub fn validate_order<'a, I>(rows: I) -> Result<(), AnalyteError>
where
    I: IntoIterator<Item = &'a ReferencePeak>,
{
    let mut finished: Vec<(&str, i32)> = Vec::new();
    let mut previous: Option<&ReferencePeak> = None;
    for row in rows {
        if let Some(prev) = previous {
            let same_group = prev.analyte == row.analyte && prev.charge == row.charge;
            let out_of_order = if same_group {
                row.isotopologue <= prev.isotopologue
            } else {
                finished.push((prev.analyte.as_str(), prev.charge));
                finished.contains(&(row.analyte.as_str(), row.charge))
            };
            if out_of_order {
                return Err(AnalyteError::UnsortedReference {
                    previous: prev.peak.clone(),
                    current: row.peak.clone(),
                });
            }
        }
        previous = Some(row);
    }
    Ok(())
}

/// Reference peaks for a whole analyte list, in analyte-list order
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    peaks: Vec<ReferencePeak>,
}

impl ReferenceTable {
    /// Build the table, reporting `(done, total)` after each analyte
    pub fn build<F>(
        specs: &[AnalyteSpec],
        blocks: &BlockSet,
        mut progress: F,
    ) -> Result<Self, AnalyteError>
    where
        F: FnMut(usize, usize),
    {
        let total = specs.len();

        #[cfg(feature = "parallel")]
        let references: Vec<AnalyteReference> = {
            use rayon::prelude::*;
            let built = specs
                .par_iter()
                .map(|spec| AnalyteReference::build(spec.clone(), blocks))
                .collect::<Result<Vec<_>, _>>()?;
            for done in 1..=total {
                progress(done, total);
            }
            built
        };

        #[cfg(not(feature = "parallel"))]
        let references: Vec<AnalyteReference> = {
            let mut built = Vec::with_capacity(total);
            for (i, spec) in specs.iter().enumerate() {
                built.push(AnalyteReference::build(spec.clone(), blocks)?);
                progress(i + 1, total);
            }
            built
        };

        let peaks: Vec<ReferencePeak> = references.into_iter().flat_map(|r| r.peaks).collect();
        let table = Self { peaks };
        for (time, window) in table.windows() {
            validate_order(table.peaks.iter().filter(|p| p.in_window(time, window)))?;
        }
        Ok(table)
    }

    pub fn from_peaks(peaks: Vec<ReferencePeak>) -> Self {
        Self { peaks }
    }

    pub fn peaks(&self) -> &[ReferencePeak] {
        &self.peaks
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Distinct `(time, time_window)` pairs in order of first appearance
    pub fn windows(&self) -> Vec<(f64, f64)> {
        let mut windows: Vec<(f64, f64)> = Vec::new();
        for peak in &self.peaks {
            if let (Some(t), Some(w)) = (peak.time, peak.time_window) {
                if !windows.contains(&(t, w)) {
                    windows.push((t, w));
                }
            }
        }
        windows
    }

    /// Rows of the sum spectrum at `(time, time_window)`
    pub fn in_window(&self, time: f64, time_window: f64) -> impl Iterator<Item = &ReferencePeak> {
        self.peaks
            .iter()
            .filter(move |p| p.in_window(time, time_window))
    }

    /// Distinct `(analyte, charge)` pairs in order of first appearance
    pub fn analyte_charges(&self) -> Vec<(String, i32)> {
        let mut pairs: Vec<(String, i32)> = Vec::new();
        for peak in &self.peaks {
            if !pairs
                .iter()
                .any(|(a, c)| *a == peak.analyte && *c == peak.charge)
            {
                pairs.push((peak.analyte.clone(), peak.charge));
            }
        }
        pairs
    }

    /// Exact m/z of the most abundant isotopologue of `(analyte, charge)`
    pub fn mz_exact(&self, analyte: &str, charge: i32) -> Option<f64> {
        self.peaks
            .iter()
            .filter(|p| p.analyte == analyte && p.charge == charge)
            .fold(None, |best: Option<&ReferencePeak>, p| match best {
                Some(b) if p.relative_area <= b.relative_area => Some(b),
                _ => Some(p),
            })
            .map(|p| p.mz)
    }

    /// Write the table as CSV
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for peak in &self.peaks {
            csv_writer.serialize(peak)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
