use crate::numeric::FitError;

/// Reasons a spectrum stays uncalibrated
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    /// No calibrants were requested for the spectrum
    #[error("No calibrants requested")]
    NoCalibrants,

    /// Too few calibrants passed the S/N cut-off
    #[error("Only {found} calibrants above S/N cut-off, {required} required")]
    TooFewCalibrants { found: usize, required: usize },

    /// Polynomial fit failed
    #[error("Calibration fit failed: {0}")]
    Fit(#[from] FitError),
}
