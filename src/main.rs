//! # mzquant
//!
//! A command-line tool for aligning, calibrating and quantifying folders of
//! mzXML runs against an analyte list.
//!
//! ## Usage
//!
//! ```bash
//! # Build the analyte reference table
//! mzquant reference analytes.csv --blocks blocks -o out
//!
//! # Align every run of a folder
//! mzquant align runs -a alignment.csv
//!
//! # Full batch: reference, alignment, quantitation and export
//! mzquant run runs --analytes analytes.csv -a alignment.csv --config mzquant.toml
//!
//! # Inspect the isotopic pattern of one analyte
//! mzquant isotopes H5N4F1 --charge-max 3
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity
    cli::init_logging(cli.verbosity());

    cli::dispatch(cli)
}
