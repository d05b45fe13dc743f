//! Synthetic XRM containers for tests and demos.
//!
//! [`SyntheticXrm`] writes the subset of the container layout this crate
//! reads. Frames are given top-down and stored bottom-up, as the instrument
//! does.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use super::axes::AxisRole;
use super::decode::DecodeStrategy;
use super::error::XrmError;
use super::fields;
use super::image::ImageDataType;
use super::source::MemoryRecordSource;

/// Builder for a minimal acquisition container
#[derive(Debug, Clone)]
pub struct SyntheticXrm {
    rows: usize,
    cols: usize,
    data_type: ImageDataType,
    frames: Vec<Vec<f32>>,
    sample_id: Option<String>,
    dates: Vec<String>,
    pixel_size: Option<f32>,
    magnification: Option<f32>,
    det_zero: Option<f32>,
    per_frame: BTreeMap<&'static str, (Vec<f32>, DecodeStrategy)>,
    axis_names: Option<Vec<String>>,
    motor_positions: Option<Vec<f32>>,
}

impl SyntheticXrm {
    /// A file with `frames` frames of `rows` x `cols` uint16 pixels.
    ///
    /// Pixel `(r, c)` of frame `f` holds `f * 1000 + r * cols + c` so every
    /// frame is asymmetric top-to-bottom.
    pub fn new(rows: usize, cols: usize, frames: usize) -> Self {
        let frames = (0..frames)
            .map(|f| {
                (0..rows * cols)
                    .map(|i| (f * 1000 + i) as f32)
                    .collect::<Vec<f32>>()
            })
            .collect();
        Self {
            rows,
            cols,
            data_type: ImageDataType::U16,
            frames,
            sample_id: None,
            dates: Vec::new(),
            pixel_size: None,
            magnification: None,
            det_zero: None,
            per_frame: BTreeMap::new(),
            axis_names: None,
            motor_positions: None,
        }
    }

    /// A fully populated file: identity, optics, per-frame metadata and a
    /// verified axis table.
    pub fn typical(rows: usize, cols: usize, frames: usize) -> Self {
        let n = frames;
        Self::new(rows, cols, frames)
            .sample_id("sample")
            .date("01/15/24 10:30:00")
            .pixel_size(0.01)
            .magnification(1500.0)
            .per_frame(fields::ANGLES, (0..n).map(|i| i as f32 - 70.0).collect())
            .per_frame(fields::ENERGY, vec![520.0; n])
            .per_frame(fields::CURRENT, vec![250.0; n])
            .per_frame(fields::EXP_TIMES, vec![1.0; n])
            .per_frame(fields::X_POSITION, vec![10.0; n])
            .per_frame(fields::Y_POSITION, vec![20.0; n])
            .per_frame(fields::Z_POSITION, vec![30.0; n])
            .standard_axes(100.0, 2.5, 5000.0)
    }

    /// Replace the frames with explicit top-down pixel data.
    pub fn frames(mut self, frames: Vec<Vec<f32>>) -> Self {
        self.frames = frames;
        self
    }

    /// Declare the pixel type.
    pub fn data_type(mut self, data_type: ImageDataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Set `SampleInfo/SampleID`.
    pub fn sample_id(mut self, id: &str) -> Self {
        self.sample_id = Some(id.to_string());
        self
    }

    /// Append an acquisition date (`MM/DD/YY HH:MM:SS`).
    pub fn date(mut self, date: &str) -> Self {
        self.dates.push(date.to_string());
        self
    }

    /// Set `ImageInfo/PixelSize`.
    pub fn pixel_size(mut self, value: f32) -> Self {
        self.pixel_size = Some(value);
        self
    }

    /// Remove `ImageInfo/PixelSize`.
    pub fn without_pixel_size(mut self) -> Self {
        self.pixel_size = None;
        self
    }

    /// Set `ImageInfo/XrayMagnification`.
    pub fn magnification(mut self, value: f32) -> Self {
        self.magnification = Some(value);
        self
    }

    /// Set a per-frame field stored contiguously.
    pub fn per_frame(self, field: &'static str, values: Vec<f32>) -> Self {
        self.per_frame_with(field, values, DecodeStrategy::Contiguous)
    }

    /// Set a per-frame field stored with an explicit layout.
    pub fn per_frame_with(
        mut self,
        field: &'static str,
        values: Vec<f32>,
        layout: DecodeStrategy,
    ) -> Self {
        self.per_frame.insert(field, (values, layout));
        self
    }

    /// Remove a per-frame field.
    pub fn without(mut self, field: &'static str) -> Self {
        self.per_frame.remove(field);
        self
    }

    /// Write an axis table with every [`AxisRole`] at its expected index, a
    /// detector zero calibration and encoder readbacks.
    pub fn standard_axes(mut self, det_zero: f32, detector_mm: f32, sample_um: f32) -> Self {
        let len = AxisRole::ALL
            .iter()
            .map(|r| r.expected_index() + 1)
            .max()
            .unwrap_or(0);
        let mut names: Vec<String> = (0..len).map(|i| format!("Axis{i}")).collect();
        let mut positions = vec![0.0f32; len];
        for role in AxisRole::ALL {
            names[role.expected_index()] = role.expected_name().to_string();
        }
        positions[AxisRole::SampleEncoder.expected_index()] = sample_um;
        positions[AxisRole::DetectorEncoder.expected_index()] = detector_mm;
        positions[AxisRole::Energy.expected_index()] = 520.0;
        positions[AxisRole::MachineCurrent.expected_index()] = 250.0;
        positions[AxisRole::EnergyEncoder.expected_index()] = 520.1;
        self.axis_names = Some(names);
        self.motor_positions = Some(positions);
        self.det_zero = Some(det_zero);
        self
    }

    /// Replace the axis table and motor positions.
    pub fn axes(mut self, names: Vec<String>, positions: Vec<f32>) -> Self {
        self.axis_names = Some(names);
        self.motor_positions = Some(positions);
        self
    }

    /// Raw records of the container, keyed by record path.
    pub fn records(&self) -> BTreeMap<String, Vec<u8>> {
        let mut records = BTreeMap::new();
        let u32_le = |v: usize| (v as u32).to_le_bytes().to_vec();

        records.insert(fields::NO_OF_IMAGES.to_string(), u32_le(self.frames.len()));
        records.insert(fields::IMAGE_HEIGHT.to_string(), u32_le(self.rows));
        records.insert(fields::IMAGE_WIDTH.to_string(), u32_le(self.cols));
        records.insert(
            fields::DATA_TYPE.to_string(),
            self.data_type.code().to_le_bytes().to_vec(),
        );

        if let Some(id) = &self.sample_id {
            records.insert(fields::SAMPLE_ID.to_string(), nul_terminated(&[id.clone()]));
        }
        if !self.dates.is_empty() {
            records.insert(fields::DATE.to_string(), nul_terminated(&self.dates));
        }
        if let Some(value) = self.pixel_size {
            records.insert(fields::PIXEL_SIZE.to_string(), value.to_le_bytes().to_vec());
        }
        if let Some(value) = self.magnification {
            records.insert(
                fields::XRAY_MAGNIFICATION.to_string(),
                value.to_le_bytes().to_vec(),
            );
        }
        if let Some(value) = self.det_zero {
            records.insert(fields::DET_ZERO.to_string(), value.to_le_bytes().to_vec());
        }
        if let Some(names) = &self.axis_names {
            records.insert(fields::AXIS_NAMES.to_string(), nul_terminated(names));
        }
        if let Some(positions) = &self.motor_positions {
            records.insert(fields::MOTOR_POSITIONS.to_string(), f32_le(positions));
        }

        for (field, (values, layout)) in &self.per_frame {
            records.insert(field.to_string(), encode_per_frame(values, *layout));
        }

        let row_len = self.cols;
        for (index, frame) in self.frames.iter().enumerate() {
            let mut bytes = Vec::with_capacity(self.rows * self.cols * self.data_type.byte_size());
            if row_len > 0 {
                for row in frame.chunks(row_len).rev() {
                    for &value in row {
                        match self.data_type {
                            ImageDataType::U16 => {
                                bytes.extend_from_slice(&(value as u16).to_le_bytes())
                            }
                            ImageDataType::F32 => bytes.extend_from_slice(&value.to_le_bytes()),
                        }
                    }
                }
            }
            records.insert(fields::image_stream_path(index), bytes);
        }

        records
    }

    /// The records as an in-memory source.
    pub fn to_memory_source(&self) -> MemoryRecordSource {
        let mut source = MemoryRecordSource::new();
        for (record, bytes) in self.records() {
            source.insert(&record, bytes);
        }
        source
    }

    /// Write the container to `path`, replacing any existing file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), XrmError> {
        let mut container = cfb::create(path.as_ref())?;
        for (record, bytes) in self.records() {
            let record = format!("/{record}");
            if let Some(parent) = Path::new(&record).parent() {
                container.create_storage_all(parent)?;
            }
            let mut stream = container.create_stream(&record)?;
            stream.write_all(&bytes)?;
        }
        container.flush()?;
        Ok(())
    }
}

fn nul_terminated(values: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for value in values {
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
    }
    bytes
}

fn f32_le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Encode a per-frame array in the given layout; padding bytes are zero.
pub fn encode_per_frame(values: &[f32], layout: DecodeStrategy) -> Vec<u8> {
    match layout {
        DecodeStrategy::Contiguous => f32_le(values),
        DecodeStrategy::PaddedStride { padding } => {
            let mut bytes = Vec::with_capacity(layout.record_len(values.len()));
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    bytes.resize(bytes.len() + padding, 0);
                }
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            bytes
        }
    }
}
