use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::debug;

use crate::mzxml::MzXmlRun;
use crate::numeric::stats::{interp_or, linspace, round_to, window_range};

use super::Spectrum;

/// Scans of one retention time window summed onto a common m/z grid
#[derive(Debug, Clone, PartialEq)]
pub struct SumSpectrum {
    /// Run the scans came from
    pub file: String,
    pub time: f64,
    pub time_window: f64,
    pub spectrum: Spectrum,
}

impl SumSpectrum {
    /// `SumSpectrum_<time>_<window>_<file>`
    pub fn name(&self) -> String {
        format!("SumSpectrum_{}_{}_{}", self.time, self.time_window, self.file)
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    /// Write `<name>.xy` into `dir`
    pub fn write_xy<P: AsRef<Path>>(&self, dir: P) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(format!("{}.xy", self.name()));
        self.spectrum.write_xy(BufWriter::new(File::create(&path)?))?;
        Ok(path)
    }
}

/// Sum the scans of `run` within `time ± time_window`.
///
/// The grid runs from the lowest to the highest m/z of the selected scans
/// with `resolution` points per Th. Each scan is linearly interpolated onto
/// the grid (zero outside its own range). Values are rounded to 8 decimals.
/// No scans in the window gives an empty spectrum.
pub fn create_sum_spectrum(
    run: &MzXmlRun,
    time: f64,
    time_window: f64,
    resolution: f64,
) -> SumSpectrum {
    let scans: Vec<_> = run
        .scans_in_window(time, time_window)
        .iter()
        .filter(|s| !s.is_empty())
        .collect();

    let empty = SumSpectrum {
        file: run.name.clone(),
        time,
        time_window,
        spectrum: Spectrum::default(),
    };
    let (Some(min_mz), Some(max_mz)) = (
        scans.iter().filter_map(|s| s.mz.first().copied()).reduce(f64::min),
        scans.iter().filter_map(|s| s.mz.last().copied()).reduce(f64::max),
    ) else {
        debug!("No scans in {} ± {} s for {}", time, time_window, run.name);
        return empty;
    };

    let points = ((max_mz - min_mz) * resolution).max(0.0) as usize;
    let grid = linspace(min_mz, max_mz, points);
    let mut summed = vec![0.0; grid.len()];

    for scan in &scans {
        let (first, last) = (scan.mz[0], scan.mz[scan.mz.len() - 1]);
        for i in window_range(&grid, first, last) {
            summed[i] += interp_or(grid[i], &scan.mz, &scan.intensity, 0.0);
        }
    }

    debug!(
        "Summed {} scans into {} points for {} at {} ± {} s",
        scans.len(),
        grid.len(),
        run.name,
        time,
        time_window
    );

    SumSpectrum {
        spectrum: Spectrum::new(
            grid.into_iter().map(|v| round_to(v, 8)).collect(),
            summed.into_iter().map(|v| round_to(v, 8)).collect(),
        ),
        ..empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mzxml::Scan;

    fn run() -> MzXmlRun {
        MzXmlRun::from_scans(
            "run",
            vec![
                Scan::new(10.0, vec![100.0, 102.0], vec![2.0, 4.0]),
                Scan::new(20.0, vec![101.0, 103.0], vec![6.0, 6.0]),
                Scan::new(90.0, vec![100.0, 103.0], vec![1000.0, 1000.0]),
            ],
        )
    }

    #[test]
    fn test_sum_of_interpolated_scans() {
        let sum = create_sum_spectrum(&run(), 15.0, 5.0, 1.0);
        // One point per Th over [100, 103]
        assert_eq!(sum.spectrum.mz, vec![100.0, 101.5, 103.0]);
        // 100: first scan only; 101.5: 3.5 + 6; 103: second scan only
        assert_eq!(sum.spectrum.intensity, vec![2.0, 9.5, 6.0]);
        assert_eq!(sum.name(), "SumSpectrum_15_5_run");
    }

    #[test]
    fn test_empty_window() {
        let sum = create_sum_spectrum(&run(), 50.0, 5.0, 100.0);
        assert!(sum.is_empty());
    }

    #[test]
    fn test_write_xy_file() {
        let dir = tempfile::tempdir().unwrap();
        let sum = create_sum_spectrum(&run(), 15.0, 5.0, 1.0);
        let path = sum.write_xy(dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("100.00000000\t2.00000000"));
    }
}
