//! # mzquant - Alignment, Calibration and Quantitation of mzXML Runs
//!
//! `mzquant` turns a folder of LC-MS runs in mzXML format into a long table of
//! per-analyte, per-charge quantitation metrics. It is built around the
//! isotopologue pattern of each analyte: every analyte is quantified from the
//! isotopic peaks that together cover a configured fraction of its theoretical
//! isotopic distribution.
//!
//! ## Key Features
//!
//! - **Isotopologue Patterns**: Compositions are expanded from `.block` files
//!   into fine-grained isotopologues, merged within 0.5 Da and pruned to the
//!   minimal set reaching the requested cumulative fraction.
//!
//! - **Retention Time Alignment**: Alignment features are located in each run
//!   by extracted ion chromatograms, then fitted with a penalized power law
//!   (with a linear fallback) and written back as `aligned_` mzXML files.
//!
//! - **Sum Spectrum Calibration**: Every retention time window is summed onto a
//!   common m/z grid and recalibrated against its calibrant analytes with a
//!   quadratic fit.
//!
//! - **Quality Metrics**: Background-subtracted areas, noise, signal-to-noise,
//!   mass error and isotopic pattern quality per analyte and charge state.
//!
//! - **Cancellable Batches**: The batch runner reports progress as events on a
//!   crossbeam channel and stops between files when cancelled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzquant::batch::{BatchConfig, BatchJob, BatchRunner};
//! use mzquant::blocks::BlockSet;
//!
//! let config = BatchConfig::default();
//! let analytes = config.analyte_defaults().read_file("analytes.csv")?;
//! let job = BatchJob::new(config, BlockSet::from_dir("blocks")?)
//!     .with_analytes(analytes)
//!     .with_directory("runs");
//!
//! let handle = BatchRunner::new(job).spawn()?;
//! for event in handle.events.iter() {
//!     println!("{:?}", event);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`isotopes`]: Natural isotope masses and abundances
//! - [`blocks`]: Building block files and the block registry
//! - [`analyte`]: Analyte names, isotopologues and the reference table
//! - [`numeric`]: Splines, polynomial and Levenberg-Marquardt fits, statistics
//! - [`mzxml`]: Streaming mzXML reader and the aligned-file writer
//! - [`chromatography`]: Extracted ion chromatograms and retention time alignment
//! - [`spectrum`]: Sum spectra, isotopic peaks and mass calibration
//! - [`quantitation`]: Per-analyte aggregation and the long result table
//! - [`tables`]: Analyte and alignment list parsing
//! - [`report`]: Reference, figure and result writers
//! - [`batch`]: The batch state machine, events and cancellation

// Allow some patterns common in scientific code
#![allow(clippy::too_many_arguments)]

pub mod analyte;
pub mod batch;
pub mod blocks;
pub mod chromatography;
pub mod isotopes;
pub mod mzxml;
pub mod numeric;
pub mod quantitation;
pub mod report;
pub mod spectrum;
pub mod tables;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::analyte::{AnalyteReference, AnalyteSpec, MzWindowCoefficients, ReferenceTable};
    pub use crate::batch::{
        BatchConfig, BatchEvent, BatchJob, BatchOutcome, BatchRunner, BatchState,
        CancellationToken, SumSpectrumSetting,
    };
    pub use crate::blocks::{Block, BlockSet};
    pub use crate::chromatography::{align_run, AlignmentFeature, Eic};
    pub use crate::mzxml::{MzXmlReader, MzXmlRun, Scan};
    pub use crate::quantitation::{build_quantitation_table, QuantitationRow};
    pub use crate::report::{CsvReportSink, ReportSink};
    pub use crate::spectrum::{create_sum_spectrum, MassSpectrum, SumSpectrum};
}
