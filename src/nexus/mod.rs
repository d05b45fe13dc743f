//! NeXus HDF5 output.
//!
//! One container per job, laid out as:
//!
//! ```text
//! /<entry>/                  NXentry: title, definition, program_name, start_time, end_time
//!   instrument/              NXinstrument: name
//!     source/                NXsource: name, type, probe, energy[eV]
//!     sample/                NXdetector: data[frames,rows,cols], sequence_number,
//!                            Number of Frames, Image Height, Image Width, Data Type,
//!                            distance[um], x/y_pixel_size[um], magnification,
//!                            current[mA], ExpTimes[s], 0_degrees_*_image
//!     bright_field/          NXdetector, only with bright-field frames
//!     dark_field/            NXdetector, only with dark-field frames
//!   sample/                  NXsample: name, rotation_angle[degrees], x/y/z_translation[um]
//!   control/                 NXmonitor: data (ones, one per frame written)
//!   data/                    NXdata: data -> instrument/sample/data (hard link)
//! ```
//!
//! [`NexusWriter`] enforces the order of the write phases; see its docs.

mod config;
mod error;
pub mod layout;
mod stats;
mod writer;

#[cfg(test)]
mod tests;

pub use config::{FacilityInfo, OverwritePolicy, WriterConfig};
pub use error::NexusError;
pub use stats::WriterStats;
pub use writer::{NexusWriter, WriterState};
