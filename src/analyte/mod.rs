//! # Analytes and isotopologue references
//!
//! Converts an analyte name plus block definitions into a monoisotopic mass,
//! a probability-weighted isotopologue ladder and finally the table of
//! expected m/z peaks per charge state that quantitation integrates.
//!
//! ```text
//! "H5N4" + blocks ─▶ monoisotopic mass ─┐
//!                 └▶ composition ───────┴▶ isotopologues ─▶ reference peaks
//! ```

mod composition;
mod error;
mod isotopologues;
mod reference;

pub use composition::{monoisotopic_mass, parse_name, variable_composition, Composition};
pub use error::AnalyteError;
pub use isotopologues::{
    heavy_isotope_distribution, isotopic_combinations, isotopologues, merge_isotopic_masses,
    select_isotopologues, HeavyIsotopeDistribution, Isotopologue, MERGE_EPSILON,
};
pub use reference::{
    reference_rows, validate_order, AnalyteReference, AnalyteSpec, MzWindowCoefficients,
    ReferencePeak, ReferenceTable,
};
