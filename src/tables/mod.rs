//! # Input tables
//!
//! Readers for the two user-supplied CSV lists of a batch:
//!
//! - the **analyte list** (`analyte, charge_min, charge_max, calibrant, time,
//!   time_window, mz_window`), turned into [`AnalyteSpec`](crate::analyte::AnalyteSpec)s
//! - the **alignment list** (`mz, time, mz_window, time_window, sn_cutoff,
//!   required`), turned into [`AlignmentFeature`](crate::chromatography::AlignmentFeature)s
//!
//! Header names are matched case-insensitively. Empty cells in optional
//! columns fall back to the batch defaults; a non-empty `calibrant` or
//! `required` cell means true.

mod alignment;
mod analytes;
mod error;

pub use alignment::{read_alignment_list, AlignmentDefaults};
pub use analytes::{read_analyte_list, AnalyteDefaults};
pub use error::TableError;

use std::collections::HashMap;
use std::io::Read;

/// Header-indexed access to the cells of one CSV row
struct Row<'a> {
    /// 1-based data row number, for error messages
    number: usize,
    record: &'a csv::StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl<'a> Row<'a> {
    /// Trimmed cell content, `None` when empty or the column is absent
    fn text(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, column: &str) -> bool {
        self.text(column).is_some()
    }

    fn optional_number(&self, column: &str) -> Result<Option<f64>, TableError> {
        self.text(column)
            .map(|value| {
                value.parse::<f64>().map_err(|_| TableError::InvalidValue {
                    row: self.number,
                    column: column.to_string(),
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    fn number(&self, column: &str) -> Result<f64, TableError> {
        self.optional_number(column)?
            .ok_or_else(|| TableError::MissingValue {
                row: self.number,
                column: column.to_string(),
            })
    }

    fn non_negative(&self, column: &str) -> Result<Option<f64>, TableError> {
        match self.optional_number(column)? {
            Some(v) if v < 0.0 => Err(TableError::NegativeValue {
                row: self.number,
                column: column.to_string(),
            }),
            other => Ok(other),
        }
    }

    /// Integer cell; spreadsheets export whole numbers as `2.0`
    fn integer(&self, column: &str) -> Result<i32, TableError> {
        let value = self.number(column)?;
        if value.fract() != 0.0 || value.abs() > f64::from(i32::MAX) {
            return Err(TableError::InvalidValue {
                row: self.number,
                column: column.to_string(),
                value: value.to_string(),
            });
        }
        Ok(value as i32)
    }
}

/// Read a CSV table, checking for `required` columns, and map every
/// non-blank row through `parse`
fn read_table<R, T, F>(reader: R, required: &[&str], mut parse: F) -> Result<Vec<T>, TableError>
where
    R: Read,
    F: FnMut(&Row) -> Result<T, TableError>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let columns: HashMap<String, usize> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect();

    if let Some(missing) = required.iter().find(|c| !columns.contains_key(**c)) {
        return Err(TableError::MissingColumn(missing.to_string()));
    }

    let mut rows = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row = Row {
            number: i + 1,
            record: &record,
            columns: &columns,
        };
        rows.push(parse(&row)?);
    }
    Ok(rows)
}
