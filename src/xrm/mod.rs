//! XRM/TXRM acquisition file reading.
//!
//! XRM (single frame) and TXRM (multi frame) files are OLE compound
//! containers holding little-endian records under named paths:
//!
//! ```text
//! SampleInfo/SampleID
//! ImageInfo/{NoOfImages, ImageWidth, ImageHeight, DataType, PixelSize,
//!            XrayMagnification, Date, Angles, Energy, Current, ExpTimes,
//!            XPosition, YPosition, ZPosition}
//! PositionInfo/{AxisNames, MotorPositions}
//! ImageData<bucket>/Image<n>          # bucket = ceil(n / 100), n from 1
//! ```
//!
//! The module is layered:
//!
//! - [`RecordSource`]: byte access to named records ([`CompoundFileSource`]
//!   on disk, [`MemoryRecordSource`] in memory)
//! - [`decode`]: pure decoding of scalars, text, per-frame arrays and frames
//! - [`XrmReader`]: typed field access, axis verification, image frames
//!
//! # Field presence
//!
//! Which records exist varies between firmware revisions. Optional fields are
//! read through `probe_*` methods returning `Ok(None)` when absent. Frame
//! count, geometry and image streams are required and fail with
//! [`XrmError::FieldAbsent`].
//!
//! # Per-frame arrays
//!
//! Per-frame arrays are normally `frame_count` packed floats. Some files pad
//! every element after the first; when the contiguous length does not match,
//! [`decode::decode_with_fallback`] retries with the padded-stride layout.

pub mod axes;
pub mod decode;
pub mod error;
pub mod fields;
pub mod image;
pub mod reader;
pub mod source;
pub mod synthetic;

#[cfg(test)]
mod tests;

pub use axes::{AxisLookup, AxisRole};
pub use decode::{DecodeError, DecodeStrategy};
pub use error::XrmError;
pub use fields::FieldSpec;
pub use image::{Frame, ImageDataType, ImageGeometry};
pub use reader::XrmReader;
pub use source::{CompoundFileSource, MemoryRecordSource, RecordSource};
pub use synthetic::SyntheticXrm;
