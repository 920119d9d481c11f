use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::analyte::{AnalyteError, ReferenceTable};
use crate::spectrum::MassSpectrum;

use super::{quantify, AnalyteMetrics};

/// One row of the long-format result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitationRow {
    pub file: String,
    pub analyte: String,
    pub charge: i32,
    pub mz_exact: Option<f64>,
    pub isotopic_fraction: Option<f64>,
    pub total_area_background_subtracted: Option<f64>,
    pub mass_error_ppm: Option<f64>,
    pub isotopic_pattern_quality: Option<f64>,
    pub signal_to_noise: Option<f64>,
    pub total_area: Option<f64>,
    pub total_background: Option<f64>,
    pub total_noise: Option<f64>,
}

fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

fn first_defined(slot: &mut Option<f64>, value: Option<f64>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl QuantitationRow {
    /// Row with identity columns only
    pub fn blank(file: &str, analyte: &str, charge: i32, mz_exact: Option<f64>) -> Self {
        Self {
            file: file.to_string(),
            analyte: analyte.to_string(),
            charge,
            mz_exact,
            isotopic_fraction: None,
            total_area_background_subtracted: None,
            mass_error_ppm: None,
            isotopic_pattern_quality: None,
            signal_to_noise: None,
            total_area: None,
            total_background: None,
            total_noise: None,
        }
    }

    /// Fill still-empty metric columns from `metrics`
    fn merge(&mut self, metrics: &AnalyteMetrics) {
        first_defined(&mut self.isotopic_fraction, defined(metrics.isotopic_fraction));
        first_defined(
            &mut self.total_area_background_subtracted,
            defined(metrics.total_area_background_subtracted),
        );
        first_defined(&mut self.mass_error_ppm, defined(metrics.mass_error_ppm));
        first_defined(
            &mut self.isotopic_pattern_quality,
            metrics.isotopic_pattern_quality.and_then(defined),
        );
        first_defined(&mut self.signal_to_noise, defined(metrics.signal_to_noise));
        first_defined(&mut self.total_area, defined(metrics.total_area));
        first_defined(&mut self.total_background, defined(metrics.total_background));
        first_defined(&mut self.total_noise, defined(metrics.total_noise));
    }
}

/// Result rows of one file: every `(analyte, charge)` of the reference,
/// ordered by analyte-list order then charge.
///
/// Spectra whose requested calibration failed leave their analytes blank.
pub fn build_quantitation_table(
    file: &str,
    spectra: &[MassSpectrum],
    reference: &ReferenceTable,
    background_mass_window: f64,
) -> Result<Vec<QuantitationRow>, AnalyteError> {
    let pairs = reference.analyte_charges();

    let mut analyte_order: Vec<&str> = Vec::new();
    for (analyte, _) in &pairs {
        if !analyte_order.contains(&analyte.as_str()) {
            analyte_order.push(analyte);
        }
    }

    let mut rows: Vec<QuantitationRow> = pairs
        .iter()
        .map(|(analyte, charge)| {
            QuantitationRow::blank(file, analyte, *charge, reference.mz_exact(analyte, *charge))
        })
        .collect();
    let index: HashMap<(String, i32), usize> = pairs
        .iter()
        .enumerate()
        .map(|(i, (analyte, charge))| ((analyte.clone(), *charge), i))
        .collect();

    for spectrum in spectra {
        let Some(analytes) = quantify(spectrum, reference, background_mass_window)? else {
            continue;
        };
        for analyte in analytes {
            if let Some(&i) = index.get(&(analyte.name.clone(), analyte.charge)) {
                rows[i].merge(&analyte.metrics());
            }
        }
    }

    rows.sort_by_key(|row| {
        let rank = analyte_order
            .iter()
            .position(|a| *a == row.analyte)
            .unwrap_or(usize::MAX);
        (rank, row.charge)
    });
    Ok(rows)
}

/// Append `rows` as CSV, with a header only when `header` is set
pub fn write_rows<W: Write>(writer: W, rows: &[QuantitationRow], header: bool) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(header)
        .from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read rows written by [`write_rows`]
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<QuantitationRow>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader)
        .deserialize()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyte::ReferencePeak;
    use crate::spectrum::{CalibrationStatus, Spectrum};

    fn peak(analyte: &str, charge: i32, iso: usize, mz: f64, relative: f64) -> ReferencePeak {
        ReferencePeak {
            peak: format!("{}_{}_{}", analyte, charge, iso),
            analyte: analyte.to_string(),
            charge,
            isotopologue: iso,
            charge_carrier: "proton".to_string(),
            mz,
            relative_area: relative,
            mz_window: 0.05,
            time: Some(100.0),
            time_window: Some(10.0),
            calibrant: false,
        }
    }

    fn reference() -> ReferenceTable {
        ReferenceTable::from_peaks(vec![
            peak("B", 2, 0, 400.0, 0.6),
            peak("B", 2, 1, 400.5, 0.4),
            peak("A", 1, 0, 700.0, 0.7),
            peak("A", 1, 1, 701.0, 0.3),
            peak("B", 1, 0, 799.0, 0.6),
        ])
    }

    fn spectrum(status: CalibrationStatus) -> MassSpectrum {
        let mz: Vec<f64> = (0..60_000).map(|i| 380.0 + i as f64 * 0.01).collect();
        let intensity = mz
            .iter()
            .map(|&x| if (x - 700.0).abs() < 0.02 { 500.0 } else { 5.0 })
            .collect();
        let mut spectrum = MassSpectrum::uncalibrated(
            "s".to_string(),
            "run".to_string(),
            Some(100.0),
            Some(10.0),
            Spectrum::new(mz, intensity),
        );
        spectrum.status = status;
        spectrum
    }

    #[test]
    fn test_rows_in_analyte_then_charge_order() {
        let rows =
            build_quantitation_table("run", &[spectrum(CalibrationStatus::Skipped)], &reference(), 10.0)
                .unwrap();
        let keys: Vec<(&str, i32)> = rows.iter().map(|r| (r.analyte.as_str(), r.charge)).collect();
        assert_eq!(keys, vec![("B", 1), ("B", 2), ("A", 1)]);
        assert_eq!(rows[2].mz_exact, Some(700.0));
        assert!(rows[2].total_area.unwrap() > 0.0);
        assert!(rows[2].signal_to_noise.unwrap() > 0.0);
    }

    #[test]
    fn test_failed_calibration_leaves_blank_rows() {
        let rows =
            build_quantitation_table("run", &[spectrum(CalibrationStatus::Failed)], &reference(), 10.0)
                .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.total_area.is_none() && r.mz_exact.is_some()));
    }

    #[test]
    fn test_csv_append_and_read_back() {
        let rows = vec![
            QuantitationRow::blank("a", "H5N4", 2, Some(900.0)),
            QuantitationRow {
                total_area: Some(12.5),
                isotopic_pattern_quality: Some(0.1),
                ..QuantitationRow::blank("b", "H5N4", 2, Some(900.0))
            },
        ];
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &rows[..1], true).unwrap();
        write_rows(&mut buffer, &rows[1..], false).unwrap();
        let back = read_rows(buffer.as_slice()).unwrap();
        assert_eq!(back, rows);
    }
}
