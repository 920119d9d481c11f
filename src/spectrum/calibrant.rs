use super::{IsotopicPeak, Spectrum};

/// Isotopic peak whose apex is searched over the wider calibration window
#[derive(Debug, Clone, Copy)]
pub struct Calibrant<'a> {
    pub peak: IsotopicPeak<'a>,
    /// `calibration_mass_window / |charge|` (Th)
    pub calibration_window: f64,
    /// m/z of the spline apex
    pub mz_observed: f64,
    /// Intensity at the spline apex
    pub signal: f64,
}

impl<'a> Calibrant<'a> {
    pub fn new(
        mz_exact: f64,
        charge: i32,
        spectrum: &'a Spectrum,
        integration_window: f64,
        calibration_mass_window: f64,
    ) -> Self {
        let peak = IsotopicPeak::new(mz_exact, charge, spectrum, integration_window);
        let calibration_window = calibration_mass_window / f64::from(charge.unsigned_abs().max(1));
        let (mz_observed, signal) = peak.spline_maximum(calibration_window);
        Self {
            peak,
            calibration_window,
            mz_observed,
            signal,
        }
    }

    pub fn mz_exact(&self) -> f64 {
        self.peak.mz_exact
    }

    /// Whether the apex rises above `background + cutoff·noise` measured at the apex
    pub fn passes_cutoff(&self, background_mass_window: f64, sn_cutoff: f64) -> bool {
        let background = self.peak.background_noise(self.mz_observed, background_mass_window);
        self.signal > background.intensity + sn_cutoff * background.noise
    }
}
