//! # Chromatography
//!
//! Extracted ion chromatograms of alignment features, their baseline and
//! S/N estimates, and the retention time alignment fitted from them.

mod alignment;
mod eic;
mod feature;

pub use alignment::{
    align_run, fit_retention_alignment, penalized_power, select_alignment_points, AlignmentFigure,
    AlignmentFit, AlignmentPoint, RunAlignment,
};
pub use eic::{background_noise, signal_to_noise, Eic, EicSummary};
pub use feature::{sort_by_time, AlignmentFeature};
