//! # xrm2nexus - XRM/TXRM to NeXus Conversion
//!
//! `xrm2nexus` converts X-ray transmission microscopy acquisitions stored in
//! compound-file XRM (single frame) and TXRM (multi frame) containers into
//! NeXus-convention HDF5 files, keeping the per-frame instrument metadata:
//! rotation angles, energies, machine currents, exposure times and sample
//! positions.
//!
//! ## Pipeline
//!
//! ```text
//! records --organize--> AcquisitionJob --resolve--> ResolvedJob --NexusWriter--> .hdf5
//!                                           |
//!                        XrmReader per file, SeriesMetadata per role
//! ```
//!
//! Each stage produces a value consumed once by the next. Inputs are read
//! one file and one frame at a time, so memory stays at one frame whatever
//! the series length.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xrm2nexus::convert::write_job;
//! use xrm2nexus::job::ResolvedJob;
//! use xrm2nexus::nexus::WriterConfig;
//!
//! let job = ResolvedJob::from_files(
//!     &["tomo_0001.txrm", "tomo_0002.txrm"],
//!     &["flat_0001.xrm"],
//!     &[],
//! )?;
//! let stats = write_job("tomo.hdf5", &job, WriterConfig::default())?;
//! println!("{}", stats);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Batches
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xrm2nexus::convert::convert_job;
//! use xrm2nexus::nexus::WriterConfig;
//! use xrm2nexus::organizer::{organize, AcquisitionRecord, PartitionMode};
//!
//! let records: Vec<AcquisitionRecord> =
//!     serde_json::from_str(&std::fs::read_to_string("manifest.json")?)?;
//! for job in organize(&records, PartitionMode::Focus) {
//!     match convert_job(&job, Path::new("out"), WriterConfig::default()) {
//!         Ok((path, stats)) => println!("{}: {}", path.display(), stats),
//!         Err(e) if e.is_skip() => println!("skipped {}", job.key),
//!         Err(e) => eprintln!("{}: {}", job.key, e),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`xrm`]: record source, field decoding and typed access to one file
//! - [`series`]: ordered concatenation of a role's files
//! - [`organizer`]: grouping of acquisition records into jobs
//! - [`job`]: immutable, fully resolved job description
//! - [`nexus`]: the output state machine
//! - [`convert`]: drivers tying the above together

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod convert;
pub mod job;
pub mod nexus;
pub mod organizer;
pub mod series;
pub mod xrm;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::convert::{convert_job, write_job, ConvertError};
    pub use crate::job::{ResolvedJob, ZeroDegreeImages};
    pub use crate::nexus::{
        FacilityInfo, NexusError, NexusWriter, OverwritePolicy, WriterConfig, WriterState,
        WriterStats,
    };
    pub use crate::organizer::{
        organize, AcquisitionJob, AcquisitionRecord, JobKey, PartitionMode, Role,
    };
    pub use crate::series::{FrameLocator, SeriesField, SeriesMetadata, SeriesReader};
    pub use crate::xrm::{
        AxisLookup, AxisRole, DecodeStrategy, Frame, ImageDataType, ImageGeometry, XrmError,
        XrmReader,
    };
}
