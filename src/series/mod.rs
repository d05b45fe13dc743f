//! Multi-file acquisition series.
//!
//! A role's files (sample, bright field or dark field) are read as one
//! logical frame series. The caller orders the file list; frames and
//! per-frame metadata are concatenated in that order.
//!
//! - [`SeriesMetadata`]: the resolved, immutable description of a series
//! - [`SeriesReader`]: global frame access keeping at most one file open
//! - [`FrameLocator`]: global index to `(file, local)` mapping

mod locator;
mod metadata;
mod reader;

pub use locator::FrameLocator;
pub use metadata::{SeriesField, SeriesMetadata};
pub use reader::SeriesReader;
