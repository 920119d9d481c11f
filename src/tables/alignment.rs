use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::chromatography::{sort_by_time, AlignmentFeature};

use super::{read_table, TableError};

const REQUIRED: &[&str] = &["mz", "time"];

/// Batch-level values for empty alignment list cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentDefaults {
    pub mz_window: f64,
    pub time_window: f64,
    pub sn_cutoff: f64,
}

/// Parse an alignment list, returning features sorted by required time
pub fn read_alignment_list<R: Read>(
    reader: R,
    defaults: &AlignmentDefaults,
) -> Result<Vec<AlignmentFeature>, TableError> {
    let mut features = read_table(reader, REQUIRED, |row| {
        let number = |column: &str| -> Result<f64, TableError> {
            row.non_negative(column)?.ok_or_else(|| TableError::MissingValue {
                row: row.number,
                column: column.to_string(),
            })
        };
        Ok(AlignmentFeature {
            mz: number("mz")?,
            time: number("time")?,
            mz_window: row.non_negative("mz_window")?.unwrap_or(defaults.mz_window),
            time_window: row
                .non_negative("time_window")?
                .unwrap_or(defaults.time_window),
            sn_cutoff: row.non_negative("sn_cutoff")?.unwrap_or(defaults.sn_cutoff),
            required: row.flag("required"),
        })
    })?;
    sort_by_time(&mut features);
    Ok(features)
}

impl AlignmentDefaults {
    /// Read an alignment list file with these defaults
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<AlignmentFeature>, TableError> {
        let file = File::open(path)?;
        read_alignment_list(BufReader::new(file), self)
    }
}
