use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::analyte::{AnalyteSpec, MzWindowCoefficients};

use super::{read_table, TableError};

const REQUIRED: &[&str] = &["analyte", "charge_min", "charge_max", "time", "time_window"];

/// Batch-level values applied to every analyte of the list
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyteDefaults {
    /// Window used when a row leaves `mz_window` empty
    pub mz_window: MzWindowCoefficients,
    pub min_isotopic_fraction: f64,
    pub charge_carrier: String,
}

/// Parse an analyte list.
///
/// A filled `mz_window` cell replaces the batch window with that constant.
pub fn read_analyte_list<R: Read>(
    reader: R,
    defaults: &AnalyteDefaults,
) -> Result<Vec<AnalyteSpec>, TableError> {
    read_table(reader, REQUIRED, |row| {
        let name = row
            .text("analyte")
            .ok_or_else(|| TableError::MissingValue {
                row: row.number,
                column: "analyte".to_string(),
            })?;
        let mz_window = match row.non_negative("mz_window")? {
            Some(window) => MzWindowCoefficients::constant(window),
            None => defaults.mz_window,
        };
        Ok(AnalyteSpec {
            name: name.to_string(),
            charge_min: row.integer("charge_min")?,
            charge_max: row.integer("charge_max")?,
            mz_window,
            time: row.non_negative("time")?,
            time_window: row.non_negative("time_window")?,
            calibrant: row.flag("calibrant"),
            min_isotopic_fraction: defaults.min_isotopic_fraction,
            charge_carrier: defaults.charge_carrier.clone(),
        })
    })
}

impl AnalyteDefaults {
    /// Read an analyte list file with these defaults
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<AnalyteSpec>, TableError> {
        let file = File::open(path)?;
        read_analyte_list(BufReader::new(file), self)
    }
}
