use serde::Serialize;

use crate::numeric::stats::{argmax_first, mean, sample_std, window_range};

/// Background region must hold at least this many points before it can shrink
const MIN_SEED_POINTS: usize = 3;
/// Shrinking stops at this many points
const SHRINK_FLOOR: usize = 2;
/// A point belongs to the background while it is at most `mean + 3·sd`
const NOISE_SIGMAS: f64 = 3.0;

/// Extracted ion chromatogram of one target m/z
#[derive(Debug, Clone, PartialEq)]
pub struct Eic {
    pub mz_exact: f64,
    /// Scan retention times, ascending
    pub times: Vec<f64>,
    pub intensities: Vec<f64>,
    pub time_required: f64,
    pub time_window: f64,
}

/// Derived quality of an EIC
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EicSummary {
    /// Observed retention time; NaN when the peak window is empty
    pub observed_time: f64,
    pub max_intensity: f64,
    pub background: f64,
    pub noise: f64,
    pub signal_to_noise: f64,
}

impl Eic {
    pub fn new(
        mz_exact: f64,
        times: Vec<f64>,
        intensities: Vec<f64>,
        time_required: f64,
        time_window: f64,
    ) -> Self {
        Self {
            mz_exact,
            times,
            intensities,
            time_required,
            time_window,
        }
    }

    /// Indices of the points within `time_required ± time_window`
    pub fn peak_window(&self) -> std::ops::Range<usize> {
        window_range(
            &self.times,
            self.time_required - self.time_window,
            self.time_required + self.time_window,
        )
    }

    /// `(time, intensity)` of the first maximum in the peak window, NaN pair if empty
    pub fn maximum(&self) -> (f64, f64) {
        let range = self.peak_window();
        let slice = &self.intensities[range.clone()];
        match argmax_first(slice) {
            Some(i) => (self.times[range.start + i], slice[i]),
            None => (f64::NAN, f64::NAN),
        }
    }

    /// Peak maximum, background and S/N in one pass
    pub fn summarize(&self) -> EicSummary {
        let (observed_time, max_intensity) = self.maximum();
        let (background, noise) = background_noise(&self.intensities);
        EicSummary {
            observed_time,
            max_intensity,
            background,
            noise,
            signal_to_noise: signal_to_noise(max_intensity, background, noise),
        }
    }
}

/// Background (mean) and noise (sample sd) of the baseline of a trace.
///
/// The intensities are sorted and the lowest quarter seeds the baseline
/// region. If the next point lies within `mean + 3·sd` the region grows one
/// point at a time until that fails; otherwise it shrinks until it holds.
/// Returns a NaN pair when the seed region has fewer than three points.
pub fn background_noise(intensities: &[f64]) -> (f64, f64) {
    let mut sorted = intensities.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mut size = (n + 3) / 4;
    if size < MIN_SEED_POINTS || size >= n {
        return (f64::NAN, f64::NAN);
    }

    let mut avg = mean(&sorted[..size]);
    let mut sd = sample_std(&sorted[..size]);
    let region_end;

    if sorted[size] <= avg + NOISE_SIGMAS * sd {
        while sorted[size] <= avg + NOISE_SIGMAS * sd {
            size += 1;
            if size == n {
                break;
            }
            avg = mean(&sorted[..size]);
            sd = sample_std(&sorted[..size]);
        }
        // Drop the point that broke the bound
        region_end = if size < n { size - 1 } else { size };
    } else {
        while sorted[size] > avg + NOISE_SIGMAS * sd {
            size -= 1;
            if size == SHRINK_FLOOR {
                break;
            }
            avg = mean(&sorted[..size]);
            sd = sample_std(&sorted[..size]);
        }
        region_end = if size > SHRINK_FLOOR { size + 1 } else { size };
    }

    let region = &sorted[..region_end];
    (mean(region), sample_std(region))
}

/// `max(0, (intensity - background) / noise)`; NaN for zero or undefined noise
pub fn signal_to_noise(intensity: f64, background: f64, noise: f64) -> f64 {
    if noise == 0.0 || noise.is_nan() || background.is_nan() || intensity.is_nan() {
        return f64::NAN;
    }
    let sn = (intensity - background) / noise;
    if sn > 0.0 {
        sn
    } else {
        0.0
    }
}
