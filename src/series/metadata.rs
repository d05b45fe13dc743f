use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, warn};

use super::locator::FrameLocator;
use crate::xrm::{fields, ImageGeometry, XrmError, XrmReader};

/// Container date layout, e.g. `01/15/24 10:30:00`
const DATE_FORMAT: &str = "%m/%d/%y %H:%M:%S%.f";

/// Per-frame fields concatenated across a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeriesField {
    /// Exposure time, s
    ExposureTime,
    /// Machine current, mA
    Current,
    /// Beam energy, eV
    Energy,
    /// Rotation angle, degrees
    Angle,
    /// Sample X translation, um
    XPosition,
    /// Sample Y translation, um
    YPosition,
    /// Sample Z translation, um
    ZPosition,
}

impl SeriesField {
    /// All fields, in the order they are read.
    pub const ALL: [SeriesField; 7] = [
        SeriesField::ExposureTime,
        SeriesField::Current,
        SeriesField::Energy,
        SeriesField::Angle,
        SeriesField::XPosition,
        SeriesField::YPosition,
        SeriesField::ZPosition,
    ];

    /// Container record holding the field.
    pub fn record(&self) -> &'static str {
        match self {
            SeriesField::ExposureTime => fields::EXP_TIMES,
            SeriesField::Current => fields::CURRENT,
            SeriesField::Energy => fields::ENERGY,
            SeriesField::Angle => fields::ANGLES,
            SeriesField::XPosition => fields::X_POSITION,
            SeriesField::YPosition => fields::Y_POSITION,
            SeriesField::ZPosition => fields::Z_POSITION,
        }
    }
}

/// Resolved description of one role's ordered file list.
///
/// Every per-frame sequence present has exactly [`frame_count`](Self::frame_count)
/// values. A field absent from any file is absent for the whole series.
/// Distance, pixel size, magnification, sample name and geometry are taken
/// from the first file only.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMetadata {
    files: Vec<PathBuf>,
    locator: FrameLocator,
    geometry: ImageGeometry,
    sample_name: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    distance: Option<f64>,
    pixel_size: Option<f32>,
    magnification: Option<f32>,
    per_frame: BTreeMap<SeriesField, Vec<f32>>,
}

impl SeriesMetadata {
    /// Open each file in list order, one at a time, and concatenate.
    ///
    /// # Errors
    /// `EmptySeries` for an empty list or zero total frames; any fatal
    /// error of an individual file (open failure, missing geometry,
    /// undecodable per-frame field).
    pub fn resolve<P: AsRef<Path>>(files: &[P]) -> Result<Self, XrmError> {
        let first_path = files
            .first()
            .ok_or_else(|| XrmError::EmptySeries("no files given".to_string()))?
            .as_ref();

        let mut first = XrmReader::open(first_path)?;
        let geometry = first.geometry()?;
        let sample_name = first.sample_name()?;
        let distance = first.get_distance()?;
        let pixel_size = first.pixel_size()?;
        let magnification = first.magnification()?;
        drop(first);

        let mut counts = Vec::with_capacity(files.len());
        let mut start_date = None;
        let mut end_date = None;
        let mut accumulated: BTreeMap<SeriesField, Option<Vec<f32>>> = SeriesField::ALL
            .iter()
            .map(|&field| (field, Some(Vec::new())))
            .collect();

        for (file_index, path) in files.iter().enumerate() {
            let path = path.as_ref();
            let mut reader = XrmReader::open(path)?;
            let count = reader.frame_count()?;
            let file_geometry = reader.geometry()?;
            if file_geometry != geometry {
                warn!(
                    "{}: geometry {:?} differs from first file {:?}",
                    path.display(),
                    file_geometry,
                    geometry
                );
            }

            let dates = reader.dates()?;
            if file_index == 0 {
                start_date = dates.first().cloned();
            }
            if file_index + 1 == files.len() {
                end_date = dates.last().cloned();
            }

            for (field, values) in accumulated.iter_mut() {
                if values.is_none() {
                    continue;
                }
                match reader.probe_per_frame_array(field.record(), count)? {
                    Some(file_values) => {
                        if let Some(series) = values.as_mut() {
                            series.extend(file_values);
                        }
                    }
                    None => {
                        warn!(
                            "{}: {} absent, omitting it for the whole series",
                            path.display(),
                            field.record()
                        );
                        *values = None;
                    }
                }
            }

            debug!("{}: {} frames", path.display(), count);
            counts.push(count);
            reader.close();
        }

        let locator = FrameLocator::from_counts(&counts);
        if locator.total() == 0 {
            return Err(XrmError::EmptySeries(format!(
                "{} file(s) starting at {} hold no frames",
                files.len(),
                first_path.display()
            )));
        }

        let per_frame = accumulated
            .into_iter()
            .filter_map(|(field, values)| values.map(|v| (field, v)))
            .collect();

        Ok(Self {
            files: files.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            locator,
            geometry,
            sample_name,
            start_date,
            end_date,
            distance,
            pixel_size,
            magnification,
            per_frame,
        })
    }

    /// Files of the series, in order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Global frame index mapping.
    pub fn locator(&self) -> &FrameLocator {
        &self.locator
    }

    /// Total frames across all files.
    pub fn frame_count(&self) -> usize {
        self.locator.total()
    }

    /// Frame shape and pixel type of the first file.
    pub fn geometry(&self) -> ImageGeometry {
        self.geometry
    }

    /// Sample identifier of the first file.
    pub fn sample_name(&self) -> Option<&str> {
        self.sample_name.as_deref()
    }

    /// First date of the first file, as stored.
    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    /// Last date of the last file, as stored.
    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    /// Start date as ISO 8601.
    pub fn start_time(&self) -> Option<String> {
        self.start_date.as_deref().map(iso_timestamp)
    }

    /// End date as ISO 8601.
    pub fn end_time(&self) -> Option<String> {
        self.end_date.as_deref().map(iso_timestamp)
    }

    /// Sample-to-detector distance of the first file, um.
    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    /// Pixel size of the first file, um.
    pub fn pixel_size(&self) -> Option<f32> {
        self.pixel_size
    }

    /// Magnification of the first file.
    pub fn magnification(&self) -> Option<f32> {
        self.magnification
    }

    /// Concatenated values of a per-frame field, if every file has it.
    pub fn per_frame(&self, field: SeriesField) -> Option<&[f32]> {
        self.per_frame.get(&field).map(Vec::as_slice)
    }
}

/// Convert a container date to ISO 8601; unparseable dates pass through.
pub(crate) fn iso_timestamp(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw.trim(), DATE_FORMAT) {
        Ok(time) => time.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Err(e) => {
            debug!("Keeping date {:?} as stored: {}", raw, e);
            raw.to_string()
        }
    }
}
