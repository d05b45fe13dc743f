//! # xrm2nexus Converter
//!
//! A command-line tool for converting X-ray microscopy acquisitions to NeXus HDF5.
//!
//! ## Usage
//!
//! ```bash
//! # Convert one tomography series with its flat fields
//! xrm2nexus convert tomo.hdf5 -s tomo_0001.txrm tomo_0002.txrm -b flat.xrm
//!
//! # Convert a whole session described by a manifest
//! xrm2nexus batch manifest.json -o out/ --by repetition
//!
//! # Look inside a file
//! xrm2nexus inspect tomo_0001.txrm
//!
//! # Generate a synthetic session
//! xrm2nexus demo demo_dir
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
