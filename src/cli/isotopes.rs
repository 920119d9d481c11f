use anyhow::{Context, Result};

use mzquant::analyte::AnalyteReference;
use mzquant::blocks::BlockSet;

use super::{CommonArgs, Config};

/// Print the isotopologues and reference peaks of one analyte
pub fn run(
    analyte: String,
    charge_min: i32,
    charge_max: i32,
    min_fraction: Option<f64>,
    charge_carrier: Option<String>,
    common: CommonArgs,
) -> Result<()> {
    let mut config = Config::load(common.config.as_deref())?;
    if let Some(carrier) = charge_carrier {
        config.batch.charge_carrier = carrier;
    }
    if let Some(fraction) = min_fraction {
        config.batch.min_isotopic_fraction = fraction;
    }

    let blocks = BlockSet::from_dir(&common.blocks)
        .with_context(|| format!("Failed to load blocks from {}", common.blocks.display()))?;
    let defaults = config.batch.analyte_defaults();
    let spec = mzquant::analyte::AnalyteSpec {
        name: analyte.clone(),
        charge_min,
        charge_max,
        mz_window: defaults.mz_window,
        // Reference rows are only produced for analytes with a time window
        time: Some(0.0),
        time_window: Some(0.0),
        calibrant: false,
        min_isotopic_fraction: defaults.min_isotopic_fraction,
        charge_carrier: defaults.charge_carrier,
    };
    let reference = AnalyteReference::build(spec, &blocks)
        .with_context(|| format!("Failed to compute isotopologues of {}", analyte))?;

    println!("Analyte: {}", analyte);
    println!("Monoisotopic mass: {:.6} Da", reference.monoisotopic_mass);
    println!();
    println!("Isotopologues:");
    println!("  {:>5}  {:>14}  {:>10}", "index", "mass (Da)", "fraction");
    for isotopologue in &reference.isotopologues {
        println!(
            "  {:>5}  {:>14.6}  {:>10.6}",
            isotopologue.index, isotopologue.mass, isotopologue.probability
        );
    }
    println!();
    println!("Reference peaks:");
    println!("  {:<20}  {:>12}  {:>10}", "peak", "m/z", "window");
    for peak in &reference.peaks {
        println!("  {:<20}  {:>12.6}  {:>10.4}", peak.peak, peak.mz, peak.mz_window);
    }
    Ok(())
}
