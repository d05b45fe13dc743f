//! Record paths and layouts of the fields we read.

use super::decode::{DecodeStrategy, PER_FRAME_STRATEGIES};

/// Sample identifier text
pub const SAMPLE_ID: &str = "SampleInfo/SampleID";
/// Pixel size in micrometres (f32)
pub const PIXEL_SIZE: &str = "ImageInfo/PixelSize";
/// Per-frame machine current in mA
pub const CURRENT: &str = "ImageInfo/Current";
/// Number of frames in the file (u32)
pub const NO_OF_IMAGES: &str = "ImageInfo/NoOfImages";
/// Image width in pixels (u32)
pub const IMAGE_WIDTH: &str = "ImageInfo/ImageWidth";
/// Image height in pixels (u32)
pub const IMAGE_HEIGHT: &str = "ImageInfo/ImageHeight";
/// Per-frame beam energy in eV
pub const ENERGY: &str = "ImageInfo/Energy";
/// Image data type code (u32)
pub const DATA_TYPE: &str = "ImageInfo/DataType";
/// Acquisition date text, one entry per frame
pub const DATE: &str = "ImageInfo/Date";
/// Per-frame rotation angle in degrees
pub const ANGLES: &str = "ImageInfo/Angles";
/// Per-frame sample X position in micrometres
pub const X_POSITION: &str = "ImageInfo/XPosition";
/// Per-frame sample Y position in micrometres
pub const Y_POSITION: &str = "ImageInfo/YPosition";
/// Per-frame sample Z position in micrometres
pub const Z_POSITION: &str = "ImageInfo/ZPosition";
/// Per-frame exposure time in seconds
pub const EXP_TIMES: &str = "ImageInfo/ExpTimes";
/// X-ray magnification (f32)
pub const XRAY_MAGNIFICATION: &str = "ImageInfo/XrayMagnification";
/// Motor axis name table
pub const AXIS_NAMES: &str = "PositionInfo/AxisNames";
/// Motor positions, one f32 per axis name
pub const MOTOR_POSITIONS: &str = "PositionInfo/MotorPositions";
/// Detector mechanical zero calibration in micrometres (f32)
pub const DET_ZERO: &str = "ConfigureBackup/ConfigCamera/Camera 1/ConfigZonePlates/DetZero";

/// Frames per `ImageData<bucket>` storage
pub const IMAGES_PER_BUCKET: usize = 100;

/// Record path of a frame's image stream.
///
/// Frames are numbered from 1 inside the container and grouped a hundred per
/// storage: frame 1..=100 lives in `ImageData1`, 101..=200 in `ImageData2`.
pub fn image_stream_path(frame_index: usize) -> String {
    let number = frame_index + 1;
    let bucket = (number + IMAGES_PER_BUCKET - 1) / IMAGES_PER_BUCKET;
    format!("ImageData{bucket}/Image{number}")
}

/// Declared layout of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    /// One fixed-width value
    Scalar,
    /// One f32 per frame
    PerFrame,
    /// NUL-terminated text
    Text,
    /// f32 values of unspecified count
    Array,
}

/// A named field with its layout and decode strategies.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Record path
    pub path: &'static str,
    /// Declared layout
    pub layout: FieldLayout,
    /// Strategies tried in order for per-frame fields
    pub strategies: &'static [DecodeStrategy],
}

impl FieldSpec {
    /// A scalar field.
    pub const fn scalar(path: &'static str) -> Self {
        Self {
            path,
            layout: FieldLayout::Scalar,
            strategies: &[],
        }
    }

    /// A per-frame array field with the standard fallback chain.
    pub const fn per_frame(path: &'static str) -> Self {
        Self {
            path,
            layout: FieldLayout::PerFrame,
            strategies: &PER_FRAME_STRATEGIES,
        }
    }

    /// A free-length f32 array field.
    pub const fn array(path: &'static str) -> Self {
        Self {
            path,
            layout: FieldLayout::Array,
            strategies: &[],
        }
    }

    /// A text field.
    pub const fn text(path: &'static str) -> Self {
        Self {
            path,
            layout: FieldLayout::Text,
            strategies: &[],
        }
    }
}

/// Every field the converter knows about, for inspection.
pub const KNOWN_FIELDS: &[FieldSpec] = &[
    FieldSpec::text(SAMPLE_ID),
    FieldSpec::text(DATE),
    FieldSpec::scalar(NO_OF_IMAGES),
    FieldSpec::scalar(IMAGE_WIDTH),
    FieldSpec::scalar(IMAGE_HEIGHT),
    FieldSpec::scalar(DATA_TYPE),
    FieldSpec::scalar(PIXEL_SIZE),
    FieldSpec::scalar(XRAY_MAGNIFICATION),
    FieldSpec::scalar(DET_ZERO),
    FieldSpec::per_frame(CURRENT),
    FieldSpec::per_frame(ENERGY),
    FieldSpec::per_frame(ANGLES),
    FieldSpec::per_frame(X_POSITION),
    FieldSpec::per_frame(Y_POSITION),
    FieldSpec::per_frame(Z_POSITION),
    FieldSpec::per_frame(EXP_TIMES),
    FieldSpec::text(AXIS_NAMES),
    FieldSpec::array(MOTOR_POSITIONS),
];
