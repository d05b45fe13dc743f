//! Fully resolved conversion job.
//!
//! A [`ResolvedJob`] is built once from file lists and handed to the writer
//! as an immutable value. Every per-role series is resolved up front, so a
//! bad input file fails the job before any output is created.

use std::path::{Path, PathBuf};

use log::info;

use crate::organizer::{AcquisitionJob, Role};
use crate::series::SeriesMetadata;
use crate::xrm::XrmError;

/// The two optional single-image files taken at zero degrees before and
/// after the sample series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroDegreeImages {
    /// Image taken before the series
    pub initial: PathBuf,
    /// Image taken after the series
    pub last: PathBuf,
}

/// Immutable description of one output container's inputs
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJob {
    title: String,
    sample: SeriesMetadata,
    bright: Option<SeriesMetadata>,
    dark: Option<SeriesMetadata>,
    zero_degrees: Option<ZeroDegreeImages>,
}

fn resolve_optional<P: AsRef<Path>>(files: &[P]) -> Result<Option<SeriesMetadata>, XrmError> {
    if files.is_empty() {
        Ok(None)
    } else {
        SeriesMetadata::resolve(files).map(Some)
    }
}

impl ResolvedJob {
    /// Resolve explicit file lists; empty reference lists mean the role is
    /// absent.
    ///
    /// # Errors
    /// `EmptySeries` when there are no sample frames, or any fatal error of
    /// an input file.
    pub fn from_files<P: AsRef<Path>>(
        sample: &[P],
        bright: &[P],
        dark: &[P],
    ) -> Result<Self, XrmError> {
        let sample = SeriesMetadata::resolve(sample)?;
        let bright = resolve_optional(bright)?;
        let dark = resolve_optional(dark)?;

        let title = sample
            .sample_name()
            .map(str::to_string)
            .or_else(|| {
                sample
                    .files()
                    .first()
                    .and_then(|path| path.file_stem())
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_default();

        info!(
            "Resolved job '{}': {} sample, {} bright, {} dark frames",
            title,
            sample.frame_count(),
            bright.as_ref().map_or(0, SeriesMetadata::frame_count),
            dark.as_ref().map_or(0, SeriesMetadata::frame_count)
        );

        Ok(Self {
            title,
            sample,
            bright,
            dark,
            zero_degrees: None,
        })
    }

    /// Resolve an organizer job; the title is the job key.
    pub fn resolve(job: &AcquisitionJob) -> Result<Self, XrmError> {
        let resolved = Self::from_files(
            &job.paths(Role::Sample),
            &job.paths(Role::Bright),
            &job.paths(Role::Dark),
        )?;
        Ok(resolved.with_title(job.key.to_string()))
    }

    /// Replace the entry title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attach the zero-degree reference images.
    pub fn with_zero_degrees(mut self, initial: impl Into<PathBuf>, last: impl Into<PathBuf>) -> Self {
        self.zero_degrees = Some(ZeroDegreeImages {
            initial: initial.into(),
            last: last.into(),
        });
        self
    }

    /// Entry title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The sample series.
    pub fn sample(&self) -> &SeriesMetadata {
        &self.sample
    }

    /// Series of a role, if the job has it.
    pub fn series(&self, role: Role) -> Option<&SeriesMetadata> {
        match role {
            Role::Sample => Some(&self.sample),
            Role::Bright => self.bright.as_ref(),
            Role::Dark => self.dark.as_ref(),
        }
    }

    /// Present roles in write order: sample, bright, dark.
    pub fn roles(&self) -> impl Iterator<Item = (Role, &SeriesMetadata)> + '_ {
        [Role::Sample, Role::Bright, Role::Dark]
            .into_iter()
            .filter_map(move |role| self.series(role).map(|series| (role, series)))
    }

    /// Zero-degree images, if attached.
    pub fn zero_degrees(&self) -> Option<&ZeroDegreeImages> {
        self.zero_degrees.as_ref()
    }

    /// Frames across all present roles.
    pub fn total_frames(&self) -> usize {
        self.roles().map(|(_, series)| series.frame_count()).sum()
    }
}
