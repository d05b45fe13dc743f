use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use xrm2nexus::organizer::PartitionMode;

mod batch;
mod config;
mod convert;
mod demo;
mod inspect;

pub use config::Config;

/// xrm2nexus - XRM/TXRM to NeXus HDF5 converter
#[derive(Parser)]
#[command(name = "xrm2nexus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// How sample files of a group are split into jobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PartitionModeArg {
    /// One job per focus position
    #[default]
    Focus,
    /// One job per repetition index
    #[value(alias = "rep")]
    Repetition,
}

impl From<PartitionModeArg> for PartitionMode {
    fn from(arg: PartitionModeArg) -> Self {
        match arg {
            PartitionModeArg::Focus => PartitionMode::Focus,
            PartitionModeArg::Repetition => PartitionMode::Repetition,
        }
    }
}

/// Output flags shared by the conversion subcommands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replace existing output files
    #[arg(short = 'f', long)]
    pub overwrite: bool,

    /// Deflate level (0-9) for image datasets
    #[arg(short = 'c', long, value_name = "LEVEL")]
    pub compression: Option<u8>,

    /// Name of the NXentry group
    #[arg(long, value_name = "NAME")]
    pub entry_name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert explicit file lists into one NeXus file
    Convert {
        /// Output HDF5 file path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Sample files, in acquisition order
        #[arg(short = 's', long, num_args = 1.., required = true, value_name = "FILE")]
        sample: Vec<PathBuf>,

        /// Bright-field files, in acquisition order
        #[arg(short = 'b', long, num_args = 1.., value_name = "FILE")]
        bright: Vec<PathBuf>,

        /// Dark-field files, in acquisition order
        #[arg(short = 'd', long, num_args = 1.., value_name = "FILE")]
        dark: Vec<PathBuf>,

        /// Zero-degree images taken before and after the scan
        #[arg(long, num_args = 2, value_names = ["INITIAL", "FINAL"])]
        zero_degrees: Option<Vec<PathBuf>>,

        /// Entry title (defaults to the output file stem)
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        output_args: OutputArgs,
    },

    /// Organize a JSON manifest of acquisitions into jobs and convert each
    Batch {
        /// JSON manifest: an array of acquisition records
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,

        /// Split sample files by focus or by repetition
        #[arg(long, value_enum)]
        by: Option<PartitionModeArg>,

        /// Convert jobs in parallel (requires the parallel feature)
        #[arg(long)]
        parallel: bool,

        #[command(flatten)]
        output_args: OutputArgs,
    },

    /// Print a JSON summary of one XRM/TXRM file
    Inspect {
        /// Input XRM/TXRM file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write a synthetic acquisition set and manifest
    Demo {
        /// Output directory
        #[arg(value_name = "DIR", default_value = "xrm2nexus_demo")]
        output_dir: PathBuf,

        /// Frames per sample file
        #[arg(long, default_value_t = 4)]
        frames: usize,
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
        Commands::Convert {
            output,
            sample,
            bright,
            dark,
            zero_degrees,
            title,
            output_args,
        } => convert::run(output, sample, bright, dark, zero_degrees, title, output_args),
        Commands::Batch {
            manifest,
            output_dir,
            by,
            parallel,
            output_args,
        } => batch::run(
            manifest,
            output_dir,
            by.map(PartitionMode::from),
            parallel,
            output_args,
        ),
        Commands::Inspect { file } => inspect::run(file),
        Commands::Demo { output_dir, frames } => demo::run(output_dir, frames),
    }
}
