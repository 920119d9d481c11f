//! # Quantitation
//!
//! Integrates the reference peaks of every analyte in a (calibrated) sum
//! spectrum and folds the per-spectrum results of a file into the
//! long-format result table.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mzquant::quantitation::build_quantitation_table;
//!
//! let rows = build_quantitation_table("run01", &spectra, &reference, 10.0)?;
//! for row in &rows {
//!     println!("{} {}+ {:?}", row.analyte, row.charge, row.total_area);
//! }
//! ```

mod analyte;
mod table;

pub use analyte::{quantify, quantify_rows, AnalyteMetrics, AnalyteQuantitation, PeakMeasurement};
pub use table::{build_quantitation_table, read_rows, write_rows, QuantitationRow};
