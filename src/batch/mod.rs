//! # Batch orchestration
//!
//! Sequences reference generation, retention time alignment, quantitation
//! and export over the mzXML files of one folder.
//!
//! ```text
//! Idle ─▶ GeneratingReference ─▶ Aligning ─▶ Quantitating ─▶ Exporting ─▶ Done
//!              │                     │             │              │
//!              └─────────────────────┴─────────────┴──────────────┴─▶ Cancelled | Errored
//! ```
//!
//! A [`CancellationToken`] is polled between files. Progress, completion and
//! failures reach the caller as [`BatchEvent`]s through an [`EventSink`]: a
//! `Vec`, a closure, or the crossbeam channel of a spawned [`BatchHandle`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use mzquant::batch::{BatchConfig, BatchJob, BatchRunner, BatchEvent};
//! use mzquant::blocks::BlockSet;
//!
//! let job = BatchJob::new(BatchConfig::default(), BlockSet::from_dir("blocks")?)
//!     .with_analytes(analytes)
//!     .with_directory("runs");
//! let handle = BatchRunner::new(job).spawn()?;
//! for event in handle.events.iter() {
//!     if let BatchEvent::QuantitationProgress { percent } = event {
//!         println!("{}%", percent);
//!     }
//! }
//! let outcome = handle.join().expect("batch thread panicked");
//! ```

mod cancel;
mod config;
mod error;
mod events;
mod runner;
mod spill;

pub use cancel::CancellationToken;
pub use config::{
    resolve_sum_spectrum_settings, BatchConfig, SumSpectrumSetting, DEFAULT_CALIBRATION_SN_CUTOFF,
};
pub use error::BatchError;
pub use events::{
    percent, BatchEvent, BatchState, CallbackSink, EventSink, Notification, Severity,
};
pub use runner::{BatchHandle, BatchJob, BatchOutcome, BatchRunner};
pub use spill::ResultSpill;
