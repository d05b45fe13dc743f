//! One-shot job conversion.
//!
//! [`write_job`] drives a [`NexusWriter`] through its phases and always
//! closes it, also on failure. [`convert_job`] adds the organizer-level
//! policy: jobs without bright-field files are refused before any output is
//! created.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::job::ResolvedJob;
use crate::nexus::{NexusError, NexusWriter, WriterConfig, WriterStats};
use crate::organizer::AcquisitionJob;
use crate::xrm::XrmError;

/// Errors that abort a single job
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The sample sub-series has no bright-field files; skip this job
    #[error("No bright-field files for job {0}")]
    NoBrightField(String),

    /// An input file could not be read
    #[error("Input error: {0}")]
    XrmError(#[from] XrmError),

    /// The output container could not be written
    #[error("Output error: {0}")]
    NexusError(#[from] NexusError),
}

impl ConvertError {
    /// Whether the error is a skip signal rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, ConvertError::NoBrightField(_))
    }
}

/// Write a resolved job to `path`.
///
/// The writer is closed on every exit path. A failure after creation leaves
/// the partial file in place.
pub fn write_job<P: AsRef<Path>>(
    path: P,
    job: &ResolvedJob,
    config: WriterConfig,
) -> Result<WriterStats, ConvertError> {
    let mut writer = NexusWriter::create(path.as_ref(), config)?;

    let written = writer
        .write_metadata(job)
        .and_then(|()| writer.write_images(job))
        .and_then(|()| writer.link_canonical());
    let closed = writer.close();

    match written {
        Ok(()) => Ok(closed?),
        Err(e) => {
            if let Err(close_error) = closed {
                warn!(
                    "{}: close after failure also failed: {}",
                    path.as_ref().display(),
                    close_error
                );
            }
            Err(e.into())
        }
    }
}

/// Resolve and convert an organizer job into `output_dir`.
///
/// Returns the output path and write statistics.
///
/// # Errors
/// `NoBrightField` for skippable jobs, checked before resolving inputs or
/// creating output; otherwise any input or output error of this job.
pub fn convert_job(
    job: &AcquisitionJob,
    output_dir: &Path,
    config: WriterConfig,
) -> Result<(PathBuf, WriterStats), ConvertError> {
    if job.is_skippable() {
        warn!("Skipping job {}: no bright-field files", job.key);
        return Err(ConvertError::NoBrightField(job.key.to_string()));
    }

    let resolved = ResolvedJob::resolve(job)?;
    let path = output_dir.join(job.key.output_file_name());
    info!("Converting job {} -> {}", job.key, path.display());
    let stats = write_job(&path, &resolved, config)?;
    Ok((path, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::{organize, AcquisitionRecord, PartitionMode, Role};
    use crate::xrm::SyntheticXrm;
    use tempfile::tempdir;

    fn record(path: PathBuf, role: Role) -> AcquisitionRecord {
        AcquisitionRecord {
            path,
            role,
            date: "20240115".to_string(),
            sample: "s1".to_string(),
            energy: 520.0,
            focus: Some(0.0),
            repetition: 0,
            order_key: 0,
        }
    }

    #[test]
    fn test_skippable_job_creates_no_output() {
        let dir = tempdir().unwrap();
        let sample = dir.path().join("s.txrm");
        SyntheticXrm::typical(2, 2, 2).write(&sample).unwrap();
        let jobs = organize(&[record(sample, Role::Sample)], PartitionMode::Focus);
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let err = convert_job(&jobs[0], &out, WriterConfig::default()).unwrap_err();
        assert!(err.is_skip());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_convert_job_writes_named_output() {
        let dir = tempdir().unwrap();
        let sample = dir.path().join("s.txrm");
        let bright = dir.path().join("ff.xrm");
        SyntheticXrm::typical(2, 2, 2).write(&sample).unwrap();
        SyntheticXrm::typical(2, 2, 1).write(&bright).unwrap();
        let jobs = organize(
            &[record(sample, Role::Sample), record(bright, Role::Bright)],
            PartitionMode::Focus,
        );

        let (path, stats) = convert_job(&jobs[0], dir.path(), WriterConfig::default()).unwrap();
        assert_eq!(path, dir.path().join(jobs[0].key.output_file_name()));
        assert!(path.exists());
        assert_eq!(stats.total_frames(), 3);
    }

    #[test]
    fn test_failed_job_leaves_partial_file() {
        let dir = tempdir().unwrap();
        let sample = dir.path().join("s.txrm");
        SyntheticXrm::typical(2, 2, 2).write(&sample).unwrap();
        let job = ResolvedJob::from_files(&[sample.clone()], &[], &[]).unwrap();
        // the input disappears between resolution and writing
        std::fs::remove_file(&sample).unwrap();

        let path = dir.path().join("out.hdf5");
        let err = write_job(&path, &job, WriterConfig::default()).unwrap_err();
        assert!(matches!(err, ConvertError::NexusError(NexusError::XrmError(_))));
        assert!(!err.is_skip());
        assert!(path.exists());
    }
}
