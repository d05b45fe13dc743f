//! NeXus container writer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group, Location};
use log::{debug, info, warn};
use ndarray::{arr0, s, Array1};

use super::config::{OverwritePolicy, WriterConfig};
use super::error::NexusError;
use super::layout::{self, role_group};
use super::stats::WriterStats;
use crate::job::ResolvedJob;
use crate::organizer::Role;
use crate::series::{SeriesField, SeriesMetadata, SeriesReader};
use crate::xrm::{Frame, ImageDataType, ImageGeometry, XrmReader};

/// Lifecycle of a [`NexusWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// File and group skeleton exist
    Created,
    /// Metadata datasets written
    MetadataWritten,
    /// Image stacks written
    ImagesWritten,
    /// Canonical data link created
    Linked,
    /// File flushed and released
    Closed,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriterState::Created => "Created",
            WriterState::MetadataWritten => "MetadataWritten",
            WriterState::ImagesWritten => "ImagesWritten",
            WriterState::Linked => "Linked",
            WriterState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// Writes one job into one NeXus HDF5 container.
///
/// Operations must be called in order:
///
/// ```text
/// create -> write_metadata -> write_images -> link_canonical -> close
/// ```
///
/// Calling one out of order fails with `NexusError::InvalidState`.
/// [`close`](Self::close) is valid from any state. A failure part way
/// through leaves the partial file in place.
///
/// # Example
///
/// ```no_run
/// use xrm2nexus::job::ResolvedJob;
/// use xrm2nexus::nexus::{NexusWriter, WriterConfig};
///
/// let job = ResolvedJob::from_files(&["tomo.txrm"], &["flat.xrm"], &[])?;
/// let mut writer = NexusWriter::create("tomo.hdf5", WriterConfig::default())?;
/// writer.write_metadata(&job)?;
/// writer.write_images(&job)?;
/// writer.link_canonical()?;
/// let stats = writer.close()?;
/// println!("{}", stats);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct NexusWriter {
    file: Option<File>,
    path: PathBuf,
    config: WriterConfig,
    state: WriterState,
    stats: WriterStats,
}

impl NexusWriter {
    /// Create the output file and its fixed group skeleton.
    ///
    /// The skeleton holds the entry, `instrument` with `source` and the
    /// sample detector, `sample`, `control` and `data`. Reference detector
    /// groups are added by [`write_metadata`](Self::write_metadata) only for
    /// roles the job has.
    pub fn create<P: AsRef<Path>>(path: P, config: WriterConfig) -> Result<Self, NexusError> {
        let path = path.as_ref();
        let file = match config.overwrite {
            OverwritePolicy::Fail => {
                if path.exists() {
                    return Err(NexusError::AlreadyExists(path.to_path_buf()));
                }
                File::create_excl(path)?
            }
            OverwritePolicy::Truncate => {
                if path.exists() {
                    warn!("Replacing existing output {}", path.display());
                }
                File::create(path)?
            }
        };

        let entry = create_nx_group(&file, &config.entry_name, "NXentry")?;
        let instrument = create_nx_group(&entry, layout::INSTRUMENT, "NXinstrument")?;
        create_nx_group(&instrument, layout::SOURCE, "NXsource")?;
        create_nx_group(&instrument, role_group(Role::Sample), "NXdetector")?;
        create_nx_group(&entry, layout::SAMPLE, "NXsample")?;
        create_nx_group(&entry, layout::CONTROL, "NXmonitor")?;
        let data = create_nx_group(&entry, layout::DATA, "NXdata")?;
        set_attr_str(&data, "signal", layout::IMAGES)?;

        debug!("Created {} with entry {}", path.display(), config.entry_name);
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            config,
            state: WriterState::Created,
            stats: WriterStats::default(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Statistics so far.
    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    fn entry(&self, operation: &'static str, expected: WriterState) -> Result<Group, NexusError> {
        match &self.file {
            Some(file) if self.state == expected => Ok(file.group(&self.config.entry_name)?),
            _ => Err(NexusError::InvalidState {
                operation,
                expected,
                actual: self.state,
            }),
        }
    }

    /// Write entry, instrument, per-role and sample metadata.
    ///
    /// Fields the inputs lack are skipped, never written as placeholders.
    /// A reference role whose frame shape differs from the sample's is
    /// logged and recorded in [`WriterStats::dimension_mismatch`].
    pub fn write_metadata(&mut self, job: &ResolvedJob) -> Result<(), NexusError> {
        let entry = self.entry("write_metadata", WriterState::Created)?;
        let sample = job.sample();
        let mut sink = MetadataSink::default();

        write_text(&entry, "title", job.title())?;
        write_text(&entry, "definition", layout::DEFINITION)?;
        let program = write_text(&entry, "program_name", &self.config.program_name)?;
        set_attr_str(&program, "version", env!("CARGO_PKG_VERSION"))?;
        set_attr_str(&program, "configuration", &self.config.program_configuration)?;
        sink.text(&entry, "start_time", sample.start_time().as_deref())?;
        sink.text(&entry, "end_time", sample.end_time().as_deref())?;

        let facility = &self.config.facility;
        let instrument = entry.group(layout::INSTRUMENT)?;
        write_text(&instrument, "name", &facility.instrument_name)?;
        let source = instrument.group(layout::SOURCE)?;
        write_text(&source, "name", &facility.source_name)?;
        write_text(&source, "type", &facility.source_type)?;
        write_text(&source, "probe", &facility.probe)?;
        let energy = sample
            .per_frame(SeriesField::Energy)
            .and_then(|values| values.first().copied());
        sink.scalar(&source, "energy", energy, Some(layout::UNITS_EV))?;

        let mut mismatch = false;
        for (role, series) in job.roles() {
            let group = match role {
                Role::Sample => instrument.group(role_group(role))?,
                _ => create_nx_group(&instrument, role_group(role), "NXdetector")?,
            };
            write_role_metadata(&mut sink, &group, role, series)?;

            if role != Role::Sample && !series.geometry().same_shape(&sample.geometry()) {
                warn!(
                    "{} frames are {}x{} but sample frames are {}x{}",
                    role,
                    series.geometry().rows,
                    series.geometry().cols,
                    sample.geometry().rows,
                    sample.geometry().cols
                );
                mismatch = true;
            }
        }

        let sample_group = entry.group(layout::SAMPLE)?;
        sink.text(&sample_group, "name", sample.sample_name())?;
        let translations = [
            ("rotation_angle", SeriesField::Angle, layout::UNITS_DEGREES),
            ("x_translation", SeriesField::XPosition, layout::UNITS_UM),
            ("y_translation", SeriesField::YPosition, layout::UNITS_UM),
            ("z_translation", SeriesField::ZPosition, layout::UNITS_UM),
        ];
        for (name, field, units) in translations {
            sink.array(&sample_group, name, sample.per_frame(field), Some(units))?;
        }

        let control = entry.group(layout::CONTROL)?;
        let monitor = Array1::<f32>::ones(job.total_frames());
        control
            .new_dataset_builder()
            .with_data(&monitor)
            .create(layout::IMAGES)?;

        self.stats.metadata_fields += sink.written;
        self.stats.metadata_skipped += sink.skipped;
        self.stats.dimension_mismatch = mismatch;
        self.state = WriterState::MetadataWritten;
        debug!(
            "{}: metadata written ({} fields, {} skipped)",
            self.path.display(),
            sink.written,
            sink.skipped
        );
        Ok(())
    }

    /// Stream every present role's frames into `(frames, rows, cols)`
    /// datasets, one frame in memory at a time.
    ///
    /// Roles are written sample, bright, dark; `sequence_number` keeps
    /// counting across them. Zero-degree images, if attached, are stored as
    /// 2D datasets beside the sample stack.
    pub fn write_images(&mut self, job: &ResolvedJob) -> Result<(), NexusError> {
        let entry = self.entry("write_images", WriterState::MetadataWritten)?;
        let instrument = entry.group(layout::INSTRUMENT)?;

        let mut sequence = 0u64;
        for (role, series) in job.roles() {
            let group = instrument.group(role_group(role))?;
            let written =
                write_role_images(&group, role, series, self.config.compression, &mut sequence)?;
            match role {
                Role::Sample => self.stats.sample_frames = written,
                Role::Bright => self.stats.bright_frames = written,
                Role::Dark => self.stats.dark_frames = written,
            }
            info!("{}: wrote {} {} frames", self.path.display(), written, role);
        }

        if let Some(zero) = job.zero_degrees() {
            let group = instrument.group(role_group(Role::Sample))?;
            write_single_image(&group, layout::ZERO_DEGREES_INITIAL, &zero.initial)?;
            write_single_image(&group, layout::ZERO_DEGREES_FINAL, &zero.last)?;
            self.stats.zero_degree_images = 2;
        }

        self.state = WriterState::ImagesWritten;
        Ok(())
    }

    /// Hard-link `data/data` to the sample image stack.
    pub fn link_canonical(&mut self) -> Result<(), NexusError> {
        let entry = self.entry("link_canonical", WriterState::ImagesWritten)?;
        let data = entry.group(layout::DATA)?;
        data.link_hard(&layout::sample_images_path(&self.config.entry_name), layout::IMAGES)?;
        self.state = WriterState::Linked;
        Ok(())
    }

    /// Flush and release the file. Valid from any state; closing twice is a
    /// no-op.
    pub fn close(&mut self) -> Result<WriterStats, NexusError> {
        let file = self.file.take();
        let previous = self.state;
        self.state = WriterState::Closed;

        if let Some(file) = file {
            file.flush()?;
            drop(file);
            self.stats.file_size_bytes = std::fs::metadata(&self.path)?.len();
            if previous == WriterState::Linked {
                info!("{}: {}", self.path.display(), self.stats);
            } else {
                warn!(
                    "{}: closed in state {}, output is incomplete",
                    self.path.display(),
                    previous
                );
            }
        }
        Ok(self.stats.clone())
    }
}

impl Drop for NexusWriter {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.flush() {
                warn!("Failed to flush {} on drop: {}", self.path.display(), e);
            }
        }
    }
}

impl fmt::Debug for NexusWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NexusWriter")
            .field("path", &self.path)
            .field("entry", &self.config.entry_name)
            .field("state", &self.state)
            .finish()
    }
}

/// Counts metadata datasets written and skipped
#[derive(Debug, Default)]
struct MetadataSink {
    written: usize,
    skipped: usize,
}

impl MetadataSink {
    fn scalar<T: H5Type + Copy>(
        &mut self,
        group: &Group,
        name: &str,
        value: Option<T>,
        units: Option<&str>,
    ) -> Result<(), NexusError> {
        let Some(value) = value else {
            return self.skip(group, name);
        };
        let dataset = group.new_dataset_builder().with_data(&arr0(value)).create(name)?;
        if let Some(units) = units {
            set_attr_str(&dataset, "units", units)?;
        }
        self.written += 1;
        Ok(())
    }

    fn array<T: H5Type>(
        &mut self,
        group: &Group,
        name: &str,
        values: Option<&[T]>,
        units: Option<&str>,
    ) -> Result<(), NexusError> {
        let Some(values) = values else {
            return self.skip(group, name);
        };
        let dataset = group.new_dataset_builder().with_data(values).create(name)?;
        if let Some(units) = units {
            set_attr_str(&dataset, "units", units)?;
        }
        self.written += 1;
        Ok(())
    }

    fn text(&mut self, group: &Group, name: &str, value: Option<&str>) -> Result<(), NexusError> {
        match value {
            Some(value) => {
                write_text(group, name, value)?;
                self.written += 1;
                Ok(())
            }
            None => self.skip(group, name),
        }
    }

    fn skip(&mut self, group: &Group, name: &str) -> Result<(), NexusError> {
        debug!("{}/{}: not available, skipped", group.name(), name);
        self.skipped += 1;
        Ok(())
    }
}

fn write_role_metadata(
    sink: &mut MetadataSink,
    group: &Group,
    role: Role,
    series: &SeriesMetadata,
) -> Result<(), NexusError> {
    let geometry = series.geometry();
    sink.scalar(group, "Number of Frames", Some(series.frame_count() as u64), None)?;
    sink.scalar(group, "Image Height", Some(geometry.rows as u64), None)?;
    sink.scalar(group, "Image Width", Some(geometry.cols as u64), None)?;
    sink.text(group, "Data Type", Some(geometry.data_type.name()))?;
    sink.array(
        group,
        "current",
        series.per_frame(SeriesField::Current),
        Some(layout::UNITS_MA),
    )?;
    sink.array(
        group,
        "ExpTimes",
        series.per_frame(SeriesField::ExposureTime),
        Some(layout::UNITS_SECONDS),
    )?;

    if role == Role::Sample {
        sink.scalar(group, "distance", series.distance(), Some(layout::UNITS_UM))?;
        sink.scalar(group, "x_pixel_size", series.pixel_size(), Some(layout::UNITS_UM))?;
        sink.scalar(group, "y_pixel_size", series.pixel_size(), Some(layout::UNITS_UM))?;
        sink.scalar(group, "magnification", series.magnification(), None)?;
    }
    Ok(())
}

fn write_role_images(
    group: &Group,
    role: Role,
    series: &SeriesMetadata,
    compression: Option<u8>,
    sequence: &mut u64,
) -> Result<usize, NexusError> {
    let geometry = series.geometry();
    let frames = series.frame_count();
    let dataset = match geometry.data_type {
        ImageDataType::U16 => create_stack::<u16>(group, geometry, frames, compression)?,
        ImageDataType::F32 => create_stack::<f32>(group, geometry, frames, compression)?,
    };

    let mut reader = SeriesReader::from_metadata(series.clone());
    let mut numbers = Vec::with_capacity(frames);
    for index in 0..frames {
        let frame = reader.get_image(index)?;
        write_frame(&dataset, role, index, &frame, geometry)?;
        numbers.push(*sequence);
        *sequence += 1;
    }
    group
        .new_dataset_builder()
        .with_data(numbers.as_slice())
        .create(layout::SEQUENCE_NUMBER)?;
    Ok(frames)
}

fn create_stack<T: H5Type>(
    group: &Group,
    geometry: ImageGeometry,
    frames: usize,
    compression: Option<u8>,
) -> Result<Dataset, NexusError> {
    let (rows, cols) = (geometry.rows, geometry.cols);
    let mut builder = group.new_dataset::<T>().shape((frames, rows, cols));
    // chunk dimensions must be non-zero
    if frames > 0 && rows > 0 && cols > 0 {
        builder = builder.chunk((1, rows, cols));
        if let Some(level) = compression {
            builder = builder.deflate(level);
        }
    }
    Ok(builder.create(layout::IMAGES)?)
}

fn write_frame(
    dataset: &Dataset,
    role: Role,
    index: usize,
    frame: &Frame,
    geometry: ImageGeometry,
) -> Result<(), NexusError> {
    let expected = (geometry.rows, geometry.cols);
    if frame.dim() != expected {
        return Err(NexusError::FrameMismatch {
            role,
            index,
            detail: format!("shape {:?}, dataset expects {:?}", frame.dim(), expected),
        });
    }
    match (frame, geometry.data_type) {
        (Frame::U16(pixels), ImageDataType::U16) => {
            dataset.write_slice(pixels, s![index, .., ..])?
        }
        (Frame::F32(pixels), ImageDataType::F32) => {
            dataset.write_slice(pixels, s![index, .., ..])?
        }
        (Frame::U16(pixels), ImageDataType::F32) => {
            dataset.write_slice(&pixels.mapv(f32::from), s![index, .., ..])?
        }
        (Frame::F32(_), ImageDataType::U16) => {
            return Err(NexusError::FrameMismatch {
                role,
                index,
                detail: "float32 frame in a uint16 series".to_string(),
            })
        }
    }
    Ok(())
}

fn write_single_image(group: &Group, name: &str, path: &Path) -> Result<(), NexusError> {
    let mut reader = XrmReader::open(path)?;
    let frame = reader.get_image(0)?;
    reader.close();
    let builder = group.new_dataset_builder();
    match &frame {
        Frame::U16(pixels) => builder.with_data(pixels).create(name)?,
        Frame::F32(pixels) => builder.with_data(pixels).create(name)?,
    };
    Ok(())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode, NexusError> {
    VarLenUnicode::from_str(value).map_err(|e| NexusError::InvalidText(format!("{value:?}: {e}")))
}

fn set_attr_str(location: &Location, name: &str, value: &str) -> Result<(), NexusError> {
    let value = to_var_len_unicode(value)?;
    location
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn write_text(group: &Group, name: &str, value: &str) -> Result<Dataset, NexusError> {
    let value = to_var_len_unicode(value)?;
    Ok(group
        .new_dataset_builder()
        .with_data(&arr0(value))
        .create(name)?)
}

fn create_nx_group(parent: &Group, name: &str, class: &str) -> Result<Group, NexusError> {
    let group = parent.create_group(name)?;
    set_attr_str(&group, layout::NX_CLASS, class)?;
    Ok(group)
}
