use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod align;
mod config;
mod isotopes;
mod reference;
mod run;

pub use config::Config;

/// mzquant - alignment, calibration and quantitation of mzXML runs
#[derive(Parser)]
#[command(name = "mzquant")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Directory of `.block` files
    #[arg(long, value_name = "DIR", default_value = "blocks")]
    pub blocks: PathBuf,

    /// Load batch settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the analyte reference table
    Reference {
        /// Analyte list (CSV)
        #[arg(value_name = "ANALYTES")]
        analytes: PathBuf,

        /// Output directory (defaults to the working directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Charge carrier block
        #[arg(long)]
        charge_carrier: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Align the retention times of every mzXML file in a folder
    Align {
        /// Folder with mzXML files
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// Alignment list (CSV)
        #[arg(short, long, value_name = "FILE")]
        alignment: PathBuf,

        /// Minimum number of features for a fit
        #[arg(long)]
        min_peaks: Option<usize>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the full batch: reference, alignment, quantitation and export
    Run {
        /// Folder with mzXML files
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// Analyte list (CSV)
        #[arg(long, value_name = "FILE")]
        analytes: Option<PathBuf>,

        /// Alignment list (CSV)
        #[arg(short, long, value_name = "FILE")]
        alignment: Option<PathBuf>,

        /// Only quantify files written by alignment
        #[arg(long)]
        aligned_only: bool,

        /// Charge carrier block
        #[arg(long)]
        charge_carrier: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the isotopologue ladder and reference peaks of one analyte
    Isotopes {
        /// Analyte name, e.g. H5N4F1
        #[arg(value_name = "ANALYTE")]
        analyte: String,

        #[arg(long, default_value_t = 1)]
        charge_min: i32,

        #[arg(long, default_value_t = 1)]
        charge_max: i32,

        /// Minimum cumulative isotopic fraction
        #[arg(long)]
        min_fraction: Option<f64>,

        /// Charge carrier block
        #[arg(long)]
        charge_carrier: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Reference {
            analytes,
            output,
            charge_carrier,
            common,
        } => reference::run(analytes, output, charge_carrier, common),
        Commands::Align {
            directory,
            alignment,
            min_peaks,
            common,
        } => align::run(directory, alignment, min_peaks, common),
        Commands::Run {
            directory,
            analytes,
            alignment,
            aligned_only,
            charge_carrier,
            common,
        } => run::run(directory, analytes, alignment, aligned_only, charge_carrier, common),
        Commands::Isotopes {
            analyte,
            charge_min,
            charge_max,
            min_fraction,
            charge_carrier,
            common,
        } => isotopes::run(analyte, charge_min, charge_max, min_fraction, charge_carrier, common),
    }
}
