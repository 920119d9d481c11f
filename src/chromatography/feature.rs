use serde::{Deserialize, Serialize};

use crate::mzxml::{MzXmlRun, Scan};
use crate::numeric::stats::window_range;

use super::Eic;

/// A known compound used to anchor retention time alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentFeature {
    /// Exact m/z of the feature
    pub mz: f64,
    /// Retention time (s) the feature should be aligned to
    pub time: f64,
    /// Half-width of the m/z slice used for the EIC (Th)
    pub mz_window: f64,
    /// Half-width of the retention time search window (s)
    pub time_window: f64,
    /// Minimum chromatographic S/N to use the feature
    pub sn_cutoff: f64,
    /// Alignment of a run fails when a required feature misses its cut-off
    pub required: bool,
}

impl AlignmentFeature {
    /// Highest intensity of `scan` within `mz ± mz_window`, zero when the slice is empty
    pub fn intensity_in(&self, scan: &Scan) -> f64 {
        let range = window_range(&scan.mz, self.mz - self.mz_window, self.mz + self.mz_window);
        scan.intensity[range]
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
            .unwrap_or(0.0)
    }

    /// EIC of this feature across every scan of `run`
    pub fn extract_eic(&self, run: &MzXmlRun) -> Eic {
        let (times, intensities) = run
            .scans
            .iter()
            .map(|scan| (scan.retention_time, self.intensity_in(scan)))
            .unzip();
        Eic::new(self.mz, times, intensities, self.time, self.time_window)
    }
}

/// Order features by required retention time
pub fn sort_by_time(features: &mut [AlignmentFeature]) {
    features.sort_by(|a, b| a.time.total_cmp(&b.time));
}
