//! Acquisition records, job keys and jobs.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Energy keys are compared at 0.01 eV
pub(crate) const ENERGY_STEPS: f64 = 100.0;

/// Focus keys are compared at 0.001 um
pub(crate) const FOCUS_STEPS: f64 = 1000.0;

pub(crate) fn quantize(value: f64, steps_per_unit: f64) -> i64 {
    (value * steps_per_unit).round() as i64
}

/// What an acquisition file contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sample projections
    Sample,
    /// Bright-field (flat) references
    #[serde(alias = "bright_field", alias = "flat")]
    Bright,
    /// Dark-field references
    #[serde(alias = "dark_field")]
    Dark,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Sample => "sample",
            Role::Bright => "bright",
            Role::Dark => "dark",
        };
        f.write_str(name)
    }
}

/// One acquisition file with its identity, as indexed by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRecord {
    /// Path of the XRM/TXRM file
    pub path: PathBuf,
    /// Role of the file
    pub role: Role,
    /// Acquisition date key, e.g. `20240115`
    pub date: String,
    /// Sample identifier
    pub sample: String,
    /// Beam energy in eV
    pub energy: f64,
    /// Focus (zone plate Z) position in um
    #[serde(default)]
    pub focus: Option<f64>,
    /// Repetition index of the acquisition
    #[serde(default)]
    pub repetition: u32,
    /// Stable acquisition-time key; files are ordered by it inside a job
    #[serde(default)]
    pub order_key: i64,
}

/// How sample files of a group are split into jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionMode {
    /// One job per focus position
    #[default]
    Focus,
    /// One job per repetition index, all focus positions merged
    Repetition,
}

/// Sub-partition of a group's sample files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Partition {
    /// Quantized focus position; `None` for files without one
    Focus(Option<i64>),
    /// Repetition index
    Repetition(u32),
}

impl Partition {
    pub(crate) fn of(record: &AcquisitionRecord, mode: PartitionMode) -> Self {
        match mode {
            PartitionMode::Focus => {
                Partition::Focus(record.focus.map(|z| quantize(z, FOCUS_STEPS)))
            }
            PartitionMode::Repetition => Partition::Repetition(record.repetition),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Focus(Some(q)) => write!(f, "focus{}", *q as f64 / FOCUS_STEPS),
            Partition::Focus(None) => write!(f, "focus-none"),
            Partition::Repetition(n) => write!(f, "rep{n}"),
        }
    }
}

/// Identity of a job: group key plus sub-partition
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobKey {
    /// Acquisition date key
    pub date: String,
    /// Sample identifier
    pub sample: String,
    /// Energy quantized to 0.01 eV
    pub energy_key: i64,
    /// Sub-partition of the sample files
    pub partition: Partition,
}

impl JobKey {
    /// Energy of the job in eV.
    pub fn energy(&self) -> f64 {
        self.energy_key as f64 / ENERGY_STEPS
    }

    /// Output file name; distinct keys always give distinct names.
    pub fn output_file_name(&self) -> String {
        format!(
            "{}_{}_{:.2}eV_{}.hdf5",
            sanitize(&self.date),
            sanitize(&self.sample),
            self.energy(),
            sanitize(&self.partition.to_string())
        )
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.2} eV {}",
            self.date,
            self.sample,
            self.energy(),
            self.partition
        )
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9.-]`, so distinct inputs
/// keep distinct names and `_` stays free as the component separator.
fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for byte in part.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// One conversion job: a sample sub-series and its group's references.
///
/// File lists are ordered by [`AcquisitionRecord::order_key`]. Sample and
/// bright-field frame dimensions are not checked against each other.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionJob {
    /// Job identity
    pub key: JobKey,
    /// Sample files of the sub-partition
    pub sample: Vec<AcquisitionRecord>,
    /// Bright-field files of the group
    pub bright: Vec<AcquisitionRecord>,
    /// Dark-field files of the group
    pub dark: Vec<AcquisitionRecord>,
}

impl AcquisitionJob {
    /// A job without bright-field files cannot be normalized downstream and
    /// is skipped by the converter.
    pub fn is_skippable(&self) -> bool {
        self.bright.is_empty()
    }

    /// Ordered file paths of one role.
    pub fn paths(&self, role: Role) -> Vec<PathBuf> {
        let records = match role {
            Role::Sample => &self.sample,
            Role::Bright => &self.bright,
            Role::Dark => &self.dark,
        };
        records.iter().map(|r| r.path.clone()).collect()
    }

    /// Total number of files in the job.
    pub fn file_count(&self) -> usize {
        self.sample.len() + self.bright.len() + self.dark.len()
    }
}
