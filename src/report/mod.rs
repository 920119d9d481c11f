//! # Batch reporting
//!
//! Everything a batch hands over for presentation: the reference table, the
//! long-format results with the settings they were produced with, and the
//! diagnostic figure documents of alignment and calibration.
//!
//! [`ReportSink`] is the seam; [`CsvReportSink`] writes stamped CSV and JSON
//! files into a directory.

mod csv_sink;
mod error;
mod figures;

pub use csv_sink::CsvReportSink;
pub use error::ReportError;
pub use figures::{Figure, FigureDocument};

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::analyte::ReferenceTable;
use crate::batch::SumSpectrumSetting;
use crate::chromatography::AlignmentFeature;
use crate::quantitation::QuantitationRow;

/// Stamp prefixed to every artifact of a batch, e.g. `19-10-2026_1405`
pub fn batch_stamp(time: DateTime<Local>) -> String {
    time.format("%d-%m-%Y_%H%M").to_string()
}

/// Final output of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// `None` when quantitation did not run
    pub results: Option<Vec<QuantitationRow>>,
    /// `(setting, value)` pairs
    pub settings: Vec<(String, String)>,
    /// Features with defaults filled in, when alignment ran
    pub alignment_features: Option<Vec<AlignmentFeature>>,
    /// Per-window calibration settings, when quantitation ran
    pub sum_spectrum_settings: Option<Vec<SumSpectrumSetting>>,
}

/// Destination of batch artifacts
pub trait ReportSink {
    /// Store the reference table, returning where it went
    fn write_reference(&mut self, reference: &ReferenceTable) -> Result<PathBuf, ReportError>;

    /// Store a figure document under `name` (`alignment`, `calibration`)
    fn write_figures(&mut self, name: &str, document: &FigureDocument) -> Result<PathBuf, ReportError>;

    /// Store the final report
    fn export(&mut self, report: &BatchReport) -> Result<Vec<PathBuf>, ReportError>;
}
