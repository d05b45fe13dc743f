/// Maps global frame indices onto the files of a series.
///
/// Built from per-file frame counts. Files with zero frames are allowed and
/// never own an index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameLocator {
    /// Cumulative frame count at the end of each file
    ends: Vec<usize>,
}

impl FrameLocator {
    /// Build from per-file frame counts, in series order.
    pub fn from_counts(counts: &[usize]) -> Self {
        let ends = counts
            .iter()
            .scan(0usize, |total, &count| {
                *total += count;
                Some(*total)
            })
            .collect();
        Self { ends }
    }

    /// Total frames across all files.
    pub fn total(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    /// Number of files.
    pub fn file_count(&self) -> usize {
        self.ends.len()
    }

    /// Frames contributed by file `file`.
    pub fn count(&self, file: usize) -> Option<usize> {
        let end = *self.ends.get(file)?;
        Some(end - self.start(file))
    }

    fn start(&self, file: usize) -> usize {
        if file == 0 {
            0
        } else {
            self.ends[file - 1]
        }
    }

    /// `(file, local)` for a global index, or `None` past the end.
    pub fn locate(&self, global: usize) -> Option<(usize, usize)> {
        if global >= self.total() {
            return None;
        }
        let file = self.ends.partition_point(|&end| end <= global);
        Some((file, global - self.start(file)))
    }
}
