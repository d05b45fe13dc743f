//! TOML configuration file support.
//!
//! Settings that rarely change between runs can live in a config file:
//!
//! ```toml
//! # xrm2nexus.toml
//! [output]
//! entry_name = "SpecNXtomo"
//! overwrite = false
//! compression = 4
//!
//! [facility]
//! source_name = "ALBA"
//! source_type = "Synchrotron X-ray Source"
//! probe = "x-ray"
//! instrument_name = "BL09 @ ALBA"
//!
//! [organize]
//! by = "focus"
//! parallel = true
//! ```
//!
//! Command-line flags take precedence over file values, which take
//! precedence over the built-in defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use xrm2nexus::nexus::{OverwritePolicy, WriterConfig};
use xrm2nexus::organizer::PartitionMode;

use super::OutputArgs;

/// Root configuration structure for xrm2nexus.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Output container settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Facility description written to every entry.
    #[serde(default)]
    pub facility: FacilityConfig,

    /// Batch organization settings.
    #[serde(default)]
    pub organize: OrganizeConfig,
}

/// Output container settings.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Name of the NXentry group.
    pub entry_name: Option<String>,

    /// Replace existing output files.
    pub overwrite: Option<bool>,

    /// Deflate level (0-9) for image datasets.
    pub compression: Option<u8>,
}

/// Facility description overrides.
#[derive(Debug, Default, Deserialize)]
pub struct FacilityConfig {
    /// `instrument/source/name`.
    pub source_name: Option<String>,

    /// `instrument/source/type`.
    pub source_type: Option<String>,

    /// `instrument/source/probe`.
    pub probe: Option<String>,

    /// `instrument/name`.
    pub instrument_name: Option<String>,
}

/// Batch organization settings.
#[derive(Debug, Default, Deserialize)]
pub struct OrganizeConfig {
    /// Partition mode for sample files.
    pub by: Option<PartitionMode>,

    /// Convert jobs in parallel.
    pub parallel: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file named by `--config`, or the empty configuration.
    pub fn load(args: &OutputArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Merge flags, file values and defaults into a writer configuration.
    pub fn writer_config(&self, args: &OutputArgs) -> WriterConfig {
        let mut config = WriterConfig::default();

        if let Some(name) = args.entry_name.clone().or_else(|| self.output.entry_name.clone()) {
            config.entry_name = name;
        }
        if args.overwrite || self.output.overwrite.unwrap_or(false) {
            config.overwrite = OverwritePolicy::Truncate;
        }
        config.compression = args
            .compression
            .or(self.output.compression)
            .map(|level| level.min(9));

        let facility = &mut config.facility;
        if let Some(v) = &self.facility.source_name {
            facility.source_name = v.clone();
        }
        if let Some(v) = &self.facility.source_type {
            facility.source_type = v.clone();
        }
        if let Some(v) = &self.facility.probe {
            facility.probe = v.clone();
        }
        if let Some(v) = &self.facility.instrument_name {
            facility.instrument_name = v.clone();
        }

        config
    }
}
