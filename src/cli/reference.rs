use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use std::path::PathBuf;

use mzquant::analyte::ReferenceTable;
use mzquant::blocks::BlockSet;
use mzquant::report::{batch_stamp, CsvReportSink, ReportSink};

use super::{CommonArgs, Config};

/// Build the reference table of an analyte list
pub fn run(
    analytes: PathBuf,
    output: Option<PathBuf>,
    charge_carrier: Option<String>,
    common: CommonArgs,
) -> Result<()> {
    let mut config = Config::load(common.config.as_deref())?;
    if let Some(carrier) = charge_carrier {
        config.batch.charge_carrier = carrier;
    }

    let blocks = BlockSet::from_dir(&common.blocks)
        .with_context(|| format!("Failed to load blocks from {}", common.blocks.display()))?;
    let specs = config
        .batch
        .analyte_defaults()
        .read_file(&analytes)
        .with_context(|| format!("Failed to read analyte list {}", analytes.display()))?;
    info!("Read {} analytes from {}", specs.len(), analytes.display());

    let reference = ReferenceTable::build(&specs, &blocks, |done, total| {
        log::debug!("Reference peaks for analyte {}/{}", done, total);
    })
    .context("Failed to build reference table")?;

    let output = output.unwrap_or_else(|| PathBuf::from("."));
    let mut sink = CsvReportSink::new(&output, &batch_stamp(Local::now()));
    let path = sink.write_reference(&reference)?;

    println!(
        "{} reference peaks for {} analytes written to {}",
        reference.peaks().len(),
        specs.len(),
        path.display()
    );
    Ok(())
}
