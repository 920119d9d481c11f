use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;

#[cfg(feature = "colorized_output")]
use console::style;

use mzquant::batch::{BatchEvent, BatchHandle, BatchJob, BatchOutcome, BatchRunner, BatchState, Notification, Severity};
use mzquant::blocks::BlockSet;

use super::{CommonArgs, Config};

/// Run the full batch over `directory`
pub fn run(
    directory: PathBuf,
    analytes: Option<PathBuf>,
    alignment: Option<PathBuf>,
    aligned_only: bool,
    charge_carrier: Option<String>,
    common: CommonArgs,
) -> Result<()> {
    let mut config = Config::load(common.config.as_deref())?;
    if let Some(carrier) = charge_carrier {
        config.batch.charge_carrier = carrier;
    }
    if aligned_only {
        config.batch.quantitate_aligned_only = true;
    }
    if analytes.is_none() && alignment.is_none() {
        bail!("Nothing to do: pass --analytes and/or --alignment");
    }

    let mut job = BatchJob::new(config.batch.clone(), BlockSet::new())
        .with_directory(&directory)
        .with_sum_spectra(config.sum_spectrum);

    if let Some(path) = analytes {
        job.blocks = BlockSet::from_dir(&common.blocks)
            .with_context(|| format!("Failed to load blocks from {}", common.blocks.display()))?;
        let specs = config
            .batch
            .analyte_defaults()
            .read_file(&path)
            .with_context(|| format!("Failed to read analyte list {}", path.display()))?;
        info!("Read {} analytes from {}", specs.len(), path.display());
        job = job.with_analytes(specs);
    }

    if let Some(path) = alignment {
        let features = config
            .batch
            .alignment_defaults()
            .read_file(&path)
            .with_context(|| format!("Failed to read alignment list {}", path.display()))?;
        info!("Read {} alignment features from {}", features.len(), path.display());
        job = job.with_alignment_features(features);
    }

    let handle = BatchRunner::new(job).spawn().context("Failed to start batch thread")?;
    follow(&handle);
    let outcome = match handle.join() {
        Ok(outcome) => outcome,
        Err(_) => bail!("Batch thread panicked"),
    };
    print_outcome(&outcome)
}

/// Print progress until the batch thread hangs up
pub fn follow(handle: &BatchHandle) {
    for event in handle.events.iter() {
        match event {
            BatchEvent::StateChanged { state } => info!("Batch state: {}", state),
            BatchEvent::ReferenceProgress { percent } => eprintln!("Reference: {:>3}%", percent),
            BatchEvent::AlignmentProgress { percent } => eprintln!("Alignment: {:>3}%", percent),
            BatchEvent::QuantitationProgress { percent } => {
                eprintln!("Quantitation: {:>3}%", percent)
            }
            BatchEvent::Error { notification } => print_notification(&notification),
            BatchEvent::Aborted => eprintln!("Batch aborted"),
            BatchEvent::Finished { .. } => {}
        }
    }
}

fn print_notification(notification: &Notification) {
    let severity = match notification.severity {
        Severity::Warning => "WARNING",
        Severity::Critical => "ERROR",
    };

    #[cfg(feature = "colorized_output")]
    let severity = match notification.severity {
        Severity::Warning => style(severity).yellow().bold().to_string(),
        Severity::Critical => style(severity).red().bold().to_string(),
    };

    eprintln!("{}: {} - {}", severity, notification.title, notification.message);
    if !notification.detail.is_empty() {
        eprintln!("  {}", notification.detail);
    }
}

/// Summarise written files; a failed batch becomes a non-zero exit
pub fn print_outcome(outcome: &BatchOutcome) -> Result<()> {
    if let Some(path) = &outcome.reference {
        println!("Reference table: {}", path.display());
    }
    if !outcome.aligned.is_empty() {
        println!("Alignment outputs: {}", outcome.aligned.len());
    }
    for path in outcome.figures.iter().chain(&outcome.exported) {
        println!("  {}", path.display());
    }

    match outcome.state {
        BatchState::Done => {
            #[cfg(feature = "colorized_output")]
            println!("{}", style("Batch finished").green().bold());

            #[cfg(not(feature = "colorized_output"))]
            println!("Batch finished");

            Ok(())
        }
        BatchState::Cancelled => bail!("Batch was cancelled"),
        state => bail!("Batch ended in state '{}'", state),
    }
}
