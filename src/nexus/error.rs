use std::path::PathBuf;

use super::writer::WriterState;
use crate::organizer::Role;
use crate::xrm::XrmError;

/// Errors that can occur while writing a NeXus container
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the HDF5 library
    #[error("HDF5 error: {0}")]
    Hdf5Error(#[from] hdf5::Error),

    /// Error reading an input acquisition file
    #[error("Input error: {0}")]
    XrmError(#[from] XrmError),

    /// Output exists and the overwrite policy forbids replacing it
    #[error("Output already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// An operation was called out of order
    #[error("{operation} requires state {expected}, writer is {actual}")]
    InvalidState {
        /// Operation attempted
        operation: &'static str,
        /// State the operation requires
        expected: WriterState,
        /// State the writer is in
        actual: WriterState,
    },

    /// A frame does not fit the dataset created for its role
    #[error("{role} frame {index}: {detail}")]
    FrameMismatch {
        /// Role being written
        role: Role,
        /// Index of the frame within the role
        index: usize,
        /// What did not match
        detail: String,
    },

    /// Text that cannot be stored as an HDF5 string
    #[error("Invalid text value: {0}")]
    InvalidText(String),
}
