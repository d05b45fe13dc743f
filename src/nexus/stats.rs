use std::fmt;

/// Statistics from a completed container write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Sample frames written
    pub sample_frames: usize,
    /// Bright-field frames written
    pub bright_frames: usize,
    /// Dark-field frames written
    pub dark_frames: usize,
    /// Zero-degree reference images written (0 or 2)
    pub zero_degree_images: usize,
    /// Metadata datasets written
    pub metadata_fields: usize,
    /// Metadata datasets skipped because the input lacked them
    pub metadata_skipped: usize,
    /// A reference role's frame shape differs from the sample frames
    pub dimension_mismatch: bool,
    /// Output file size in bytes, known after close
    pub file_size_bytes: u64,
}

impl WriterStats {
    /// Frames written across all roles.
    pub fn total_frames(&self) -> usize {
        self.sample_frames + self.bright_frames + self.dark_frames
    }
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} sample, {} bright, {} dark frames and {} metadata fields ({} skipped)",
            self.sample_frames,
            self.bright_frames,
            self.dark_frames,
            self.metadata_fields,
            self.metadata_skipped
        )?;
        if self.dimension_mismatch {
            write!(f, " [dimension mismatch]")?;
        }
        Ok(())
    }
}
