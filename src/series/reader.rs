use std::path::Path;

use log::debug;

use super::metadata::SeriesMetadata;
use crate::xrm::{Frame, XrmError, XrmReader};

/// Frame access across the files of a series.
///
/// Holds at most one file open: requesting a frame owned by another file
/// closes the current one first. Frames are best read in global order.
pub struct SeriesReader {
    metadata: SeriesMetadata,
    current: Option<(usize, XrmReader)>,
}

impl SeriesReader {
    /// Resolve a file list and prepare to read its frames.
    pub fn open<P: AsRef<Path>>(files: &[P]) -> Result<Self, XrmError> {
        Ok(Self::from_metadata(SeriesMetadata::resolve(files)?))
    }

    /// Read frames of an already resolved series.
    pub fn from_metadata(metadata: SeriesMetadata) -> Self {
        Self {
            metadata,
            current: None,
        }
    }

    /// The resolved series description.
    pub fn metadata(&self) -> &SeriesMetadata {
        &self.metadata
    }

    /// Give back the series description, closing any open file.
    pub fn into_metadata(self) -> SeriesMetadata {
        self.metadata
    }

    /// Total frames across all files.
    pub fn frame_count(&self) -> usize {
        self.metadata.frame_count()
    }

    /// Decode the frame at a global index.
    ///
    /// # Errors
    /// `FrameOutOfRange` past the end of the series, or any error of the
    /// owning file.
    pub fn get_image(&mut self, global: usize) -> Result<Frame, XrmError> {
        let (file, local) =
            self.metadata
                .locator()
                .locate(global)
                .ok_or(XrmError::FrameOutOfRange {
                    index: global,
                    count: self.metadata.frame_count(),
                })?;

        let reader = match &mut self.current {
            Some((open, reader)) if *open == file => reader,
            current => {
                if let Some((_, previous)) = current.take() {
                    previous.close();
                }
                let path = &self.metadata.files()[file];
                debug!("Series switching to file {} ({})", file, path.display());
                let (_, reader) = current.insert((file, XrmReader::open(path)?));
                reader
            }
        };
        reader.get_image(local)
    }
}

impl std::fmt::Debug for SeriesReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesReader")
            .field("files", &self.metadata.files().len())
            .field("frames", &self.metadata.frame_count())
            .field("open_file", &self.current.as_ref().map(|(i, _)| *i))
            .finish()
    }
}
