//! Error types for XRM/TXRM container reading.

use std::path::PathBuf;

use thiserror::Error;

use super::decode::DecodeError;

/// Errors that can occur while reading an XRM/TXRM container.
#[derive(Error, Debug)]
pub enum XrmError {
    /// The file is missing or its bytes are not a valid compound container
    #[error("Failed to open container {}: {source}", path.display())]
    ContainerOpen {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O or format error
        #[source]
        source: std::io::Error,
    },

    /// A required field is not present in the container
    #[error("Field absent: {0}")]
    FieldAbsent(String),

    /// A present field could not be decoded with any supported layout
    #[error("Failed to decode field {field}: {source}")]
    FieldDecode {
        /// Field path inside the container
        field: String,
        /// Decode failure of the last strategy tried
        #[source]
        source: DecodeError,
    },

    /// The declared image data type code is not one we can decode
    #[error("Unsupported image data type code: {0}")]
    UnsupportedDataType(u32),

    /// A frame index outside the file or series was requested
    #[error("Frame index {index} out of range (frame count {count})")]
    FrameOutOfRange {
        /// Requested 0-based frame index
        index: usize,
        /// Number of frames available
        count: usize,
    },

    /// A series was requested over no files or over files holding no frames
    #[error("Series has no frames: {0}")]
    EmptySeries(String),

    /// Generic I/O error while reading a stream
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl XrmError {
    /// Wrap a decode failure with the field it came from.
    pub fn decode(field: &str, source: DecodeError) -> Self {
        XrmError::FieldDecode {
            field: field.to_string(),
            source,
        }
    }
}
