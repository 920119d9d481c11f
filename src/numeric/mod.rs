//! # Numerical routines
//!
//! Curve fitting and interpolation used by the peak models, the retention
//! time alignment and the spectrum calibration:
//!
//! - [`stats`]: means, sample deviations, trapezoid integration, sorted-array search
//! - [`CubicSpline`]: not-a-knot cubic interpolating spline
//! - [`Polynomial`]: least-squares polynomial fit and Horner evaluation
//! - [`levenberg_marquardt`]: nonlinear least squares for the power-law alignment

mod error;
mod linalg;
mod lm;
mod polyfit;
mod spline;
pub mod stats;

pub use error::FitError;
pub use lm::{levenberg_marquardt, LmFit, LmOptions};
pub use polyfit::Polynomial;
pub use spline::CubicSpline;
