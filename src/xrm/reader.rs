//! Typed field access over one XRM/TXRM container.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::axes::{lookup_axis, AxisLookup, AxisRole};
use super::decode::{
    decode_f32_all, decode_name_list, decode_scalar, decode_text, decode_texts,
    decode_with_fallback, DecodeStrategy, LeScalar, PER_FRAME_STRATEGIES,
};
use super::error::XrmError;
use super::fields;
use super::image::{decode_frame, Frame, ImageDataType, ImageGeometry};
use super::source::{CompoundFileSource, RecordSource};

/// Micrometres per millimetre, for the detector encoder
const UM_PER_MM: f64 = 1000.0;

/// Read-only decoder over one acquisition file.
///
/// Frame count, geometry, axis names and motor positions are read on first
/// use and cached for the life of the reader. Dropping the reader (or calling
/// [`close`](Self::close)) releases the file.
///
/// # Example
///
/// ```no_run
/// use xrm2nexus::xrm::XrmReader;
///
/// let mut reader = XrmReader::open("tomo_0001.txrm")?;
/// let frames = reader.frame_count()?;
/// let angles = reader.probe_per_frame_array("ImageInfo/Angles", frames)?;
/// let first = reader.get_image(0)?;
/// println!("{} frames of {:?}, angles present: {}", frames, first.dim(), angles.is_some());
/// reader.close();
/// # Ok::<(), xrm2nexus::xrm::XrmError>(())
/// ```
pub struct XrmReader<S = CompoundFileSource> {
    source: S,
    path: PathBuf,
    frame_count: Option<usize>,
    geometry: Option<ImageGeometry>,
    axis_names: Option<Vec<String>>,
    motor_positions: Option<Vec<f32>>,
}

impl XrmReader<CompoundFileSource> {
    /// Open a container file.
    ///
    /// # Errors
    /// Returns `XrmError::ContainerOpen` if the file is missing or not a
    /// valid compound container.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, XrmError> {
        let path = path.as_ref();
        let source = CompoundFileSource::open(path)?;
        debug!("Opened {}", path.display());
        Ok(Self::from_source(source, path))
    }
}

impl<S: RecordSource> XrmReader<S> {
    /// Wrap an already opened record source.
    pub fn from_source(source: S, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
            frame_count: None,
            geometry: None,
            axis_names: None,
            motor_positions: None,
        }
    }

    /// Path the reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the container.
    pub fn close(self) {
        debug!("Closed {}", self.path.display());
    }

    /// Whether a field is present. Never fails.
    pub fn exists(&self, field: &str) -> bool {
        self.source.exists(field)
    }

    fn read_optional(&mut self, field: &str) -> Result<Option<Vec<u8>>, XrmError> {
        if !self.source.exists(field) {
            debug!("{}: optional field {} absent", self.path.display(), field);
            return Ok(None);
        }
        self.source.read_record(field).map(Some)
    }

    /// Read a required scalar field.
    ///
    /// # Errors
    /// `FieldAbsent` if the field is missing, `FieldDecode` if the record is
    /// shorter than the value.
    pub fn get_scalar<T: LeScalar>(&mut self, field: &str) -> Result<T, XrmError> {
        let bytes = self.source.read_record(field)?;
        decode_scalar(&bytes).map_err(|e| XrmError::decode(field, e))
    }

    /// Read an optional scalar field; `None` if absent.
    pub fn probe_scalar<T: LeScalar>(&mut self, field: &str) -> Result<Option<T>, XrmError> {
        match self.read_optional(field)? {
            Some(bytes) => decode_scalar(&bytes)
                .map(Some)
                .map_err(|e| XrmError::decode(field, e)),
            None => Ok(None),
        }
    }

    /// Read an optional text field; `None` if absent or empty.
    pub fn probe_text(&mut self, field: &str) -> Result<Option<String>, XrmError> {
        Ok(self.read_optional(field)?.and_then(|bytes| decode_text(&bytes)))
    }

    /// Read a required per-frame array with the standard fallback chain.
    ///
    /// The contiguous layout is tried first, then the padded-stride layout.
    ///
    /// # Errors
    /// `FieldAbsent` if missing, `FieldDecode` if no layout matches.
    pub fn get_per_frame_array(
        &mut self,
        field: &str,
        frame_count: usize,
    ) -> Result<Vec<f32>, XrmError> {
        let bytes = self.source.read_record(field)?;
        self.decode_per_frame(field, &bytes, frame_count, &PER_FRAME_STRATEGIES)
    }

    /// Read a required per-frame array with one explicit strategy.
    pub fn get_per_frame_array_with(
        &mut self,
        field: &str,
        frame_count: usize,
        strategy: DecodeStrategy,
    ) -> Result<Vec<f32>, XrmError> {
        let bytes = self.source.read_record(field)?;
        strategy
            .decode(&bytes, frame_count)
            .map_err(|e| XrmError::decode(field, e))
    }

    /// Read an optional per-frame array; `None` if absent.
    pub fn probe_per_frame_array(
        &mut self,
        field: &str,
        frame_count: usize,
    ) -> Result<Option<Vec<f32>>, XrmError> {
        match self.read_optional(field)? {
            Some(bytes) => self
                .decode_per_frame(field, &bytes, frame_count, &PER_FRAME_STRATEGIES)
                .map(Some),
            None => Ok(None),
        }
    }

    fn decode_per_frame(
        &self,
        field: &str,
        bytes: &[u8],
        frame_count: usize,
        strategies: &[DecodeStrategy],
    ) -> Result<Vec<f32>, XrmError> {
        let (values, used) = decode_with_fallback(bytes, frame_count, strategies)
            .map_err(|e| XrmError::decode(field, e))?;
        if used != DecodeStrategy::Contiguous {
            debug!(
                "{}: {} decoded with {:?} layout",
                self.path.display(),
                field,
                used
            );
        }
        Ok(values)
    }

    /// Number of frames in the file (`ImageInfo/NoOfImages`).
    pub fn frame_count(&mut self) -> Result<usize, XrmError> {
        if let Some(count) = self.frame_count {
            return Ok(count);
        }
        let count = self.get_scalar::<u32>(fields::NO_OF_IMAGES)? as usize;
        self.frame_count = Some(count);
        Ok(count)
    }

    /// Declared frame shape and pixel type. All three fields are required.
    pub fn geometry(&mut self) -> Result<ImageGeometry, XrmError> {
        if let Some(geometry) = self.geometry {
            return Ok(geometry);
        }
        let rows = self.get_scalar::<u32>(fields::IMAGE_HEIGHT)? as usize;
        let cols = self.get_scalar::<u32>(fields::IMAGE_WIDTH)? as usize;
        let data_type = ImageDataType::from_code(self.get_scalar::<u32>(fields::DATA_TYPE)?)?;
        let geometry = ImageGeometry {
            rows,
            cols,
            data_type,
        };
        self.geometry = Some(geometry);
        Ok(geometry)
    }

    /// Sample identifier.
    pub fn sample_name(&mut self) -> Result<Option<String>, XrmError> {
        self.probe_text(fields::SAMPLE_ID)
    }

    /// Every acquisition date string in the file, in frame order.
    pub fn dates(&mut self) -> Result<Vec<String>, XrmError> {
        Ok(self
            .read_optional(fields::DATE)?
            .map(|bytes| decode_texts(&bytes))
            .unwrap_or_default())
    }

    /// Pixel size in micrometres.
    pub fn pixel_size(&mut self) -> Result<Option<f32>, XrmError> {
        self.probe_scalar(fields::PIXEL_SIZE)
    }

    /// X-ray magnification.
    pub fn magnification(&mut self) -> Result<Option<f32>, XrmError> {
        self.probe_scalar(fields::XRAY_MAGNIFICATION)
    }

    /// Motor axis name table, split on whitespace and NUL runs.
    pub fn get_axis_names(&mut self) -> Result<Vec<String>, XrmError> {
        if let Some(names) = &self.axis_names {
            return Ok(names.clone());
        }
        let names = self
            .read_optional(fields::AXIS_NAMES)?
            .map(|bytes| decode_name_list(&bytes))
            .unwrap_or_default();
        self.axis_names = Some(names.clone());
        Ok(names)
    }

    fn motor_positions(&mut self) -> Result<&[f32], XrmError> {
        if self.motor_positions.is_none() {
            let values = self
                .read_optional(fields::MOTOR_POSITIONS)?
                .map(|bytes| decode_f32_all(&bytes))
                .unwrap_or_default();
            self.motor_positions = Some(values);
        }
        Ok(self.motor_positions.as_deref().unwrap_or(&[]))
    }

    /// Locate an axis in the name table, verifying its name.
    pub fn lookup_axis(&mut self, role: AxisRole) -> Result<AxisLookup, XrmError> {
        let names = self.get_axis_names()?;
        Ok(lookup_axis(&names, role))
    }

    /// Motor value at a raw table index, without name verification.
    pub fn get_axis_value_at(&mut self, index: usize) -> Result<Option<f32>, XrmError> {
        Ok(self.motor_positions()?.get(index).copied())
    }

    /// Motor value of an axis, using the verified or fallback index.
    pub fn get_axis_value(&mut self, role: AxisRole) -> Result<Option<f32>, XrmError> {
        match self.lookup_axis(role)?.index() {
            Some(index) => self.get_axis_value_at(index),
            None => Ok(None),
        }
    }

    /// Sample-to-detector distance in micrometres.
    ///
    /// Mechanical zero plus the detector encoder (converted from mm) plus the
    /// sample encoder. `None` unless both encoders are verified by name and
    /// the calibration record is present.
    pub fn get_distance(&mut self) -> Result<Option<f64>, XrmError> {
        let sample = self.lookup_axis(AxisRole::SampleEncoder)?;
        let detector = self.lookup_axis(AxisRole::DetectorEncoder)?;
        let (sample_index, detector_index) = match (&sample, &detector) {
            (AxisLookup::Found { index: s, .. }, AxisLookup::Found { index: d, .. }) => (*s, *d),
            _ => {
                warn!(
                    "{}: distance unavailable, encoder axes not verified",
                    self.path.display()
                );
                return Ok(None);
            }
        };

        let det_zero = match self.probe_scalar::<f32>(fields::DET_ZERO)? {
            Some(value) => value,
            None => {
                warn!(
                    "{}: distance unavailable, no detector zero calibration",
                    self.path.display()
                );
                return Ok(None);
            }
        };

        let sample_enc = self.get_axis_value_at(sample_index)?;
        let detector_enc = self.get_axis_value_at(detector_index)?;
        match (sample_enc, detector_enc) {
            (Some(sample_enc), Some(detector_enc)) => Ok(Some(
                f64::from(det_zero) + f64::from(detector_enc) * UM_PER_MM + f64::from(sample_enc),
            )),
            _ => {
                warn!(
                    "{}: distance unavailable, motor positions shorter than axis table",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    /// Decode one frame; row 0 is the top of the image.
    ///
    /// # Errors
    /// `FrameOutOfRange` past the last frame, `FieldAbsent` if the image
    /// stream or a geometry field is missing, `FieldDecode` if the payload
    /// length disagrees with the declared geometry.
    pub fn get_image(&mut self, frame_index: usize) -> Result<Frame, XrmError> {
        let count = self.frame_count()?;
        if frame_index >= count {
            return Err(XrmError::FrameOutOfRange {
                index: frame_index,
                count,
            });
        }
        let geometry = self.geometry()?;
        let stream = fields::image_stream_path(frame_index);
        let bytes = self.source.read_record(&stream)?;
        decode_frame(&bytes, &geometry).map_err(|e| XrmError::decode(&stream, e))
    }
}

impl<S> std::fmt::Debug for XrmReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrmReader")
            .field("path", &self.path)
            .field("frame_count", &self.frame_count)
            .field("geometry", &self.geometry)
            .finish()
    }
}
