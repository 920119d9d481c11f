use std::io::{Seek, SeekFrom};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::quantitation::{read_rows, write_rows, QuantitationRow};

/// Append-only temporary table holding per-file results until export.
///
/// The file is deleted when the spill is dropped.
pub struct ResultSpill {
    file: NamedTempFile,
    rows: usize,
}

impl ResultSpill {
    /// Create the spill file inside `dir`
    pub fn new_in<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        Ok(Self {
            file: NamedTempFile::new_in(dir)?,
            rows: 0,
        })
    }

    /// Number of rows appended so far
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Append the rows of one file; the header goes in with the first rows
    pub fn append(&mut self, rows: &[QuantitationRow]) -> Result<(), csv::Error> {
        if rows.is_empty() {
            return Ok(());
        }
        write_rows(self.file.as_file_mut(), rows, self.rows == 0)?;
        self.rows += rows.len();
        Ok(())
    }

    /// Read every appended row back and remove the file
    pub fn finish(mut self) -> Result<Vec<QuantitationRow>, csv::Error> {
        if self.rows == 0 {
            return Ok(Vec::new());
        }
        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        read_rows(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spill_round_trip_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let mut spill = ResultSpill::new_in(dir.path()).unwrap();
        let first = vec![QuantitationRow::blank("run1", "H5N4", 2, Some(900.0))];
        let second = vec![
            QuantitationRow {
                total_area: Some(1.5),
                ..QuantitationRow::blank("run2", "H5N4", 2, Some(900.0))
            },
            QuantitationRow::blank("run2", "H5N4", 3, None),
        ];
        spill.append(&first).unwrap();
        spill.append(&[]).unwrap();
        spill.append(&second).unwrap();
        assert_eq!(spill.len(), 3);

        let rows = spill.finish().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], first[0]);
        assert_eq!(rows[1..], second[..]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
