use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use mzquant::batch::{BatchJob, BatchRunner};
use mzquant::blocks::BlockSet;

use super::run::{follow, print_outcome};
use super::{CommonArgs, Config};

/// Align every mzXML file in `directory` against an alignment list
pub fn run(
    directory: PathBuf,
    alignment: PathBuf,
    min_peaks: Option<usize>,
    common: CommonArgs,
) -> Result<()> {
    let mut config = Config::load(common.config.as_deref())?;
    if let Some(min_peaks) = min_peaks {
        config.batch.alignment_min_peaks = min_peaks;
    }

    let features = config
        .batch
        .alignment_defaults()
        .read_file(&alignment)
        .with_context(|| format!("Failed to read alignment list {}", alignment.display()))?;
    if features.len() < config.batch.alignment_min_peaks {
        log::warn!(
            "Alignment list holds {} features, fits need at least {}",
            features.len(),
            config.batch.alignment_min_peaks
        );
    }

    // Alignment needs no blocks
    let job = BatchJob::new(config.batch, BlockSet::new())
        .with_alignment_features(features)
        .with_directory(&directory);

    let handle = BatchRunner::new(job).spawn().context("Failed to start batch thread")?;
    follow(&handle);
    let outcome = match handle.join() {
        Ok(outcome) => outcome,
        Err(_) => bail!("Batch thread panicked"),
    };
    print_outcome(&outcome)
}
