//! Frame payload decoding.

use byteorder::{ByteOrder, LittleEndian};
use ndarray::{Array2, ArrayView2};

use super::decode::DecodeError;
use super::error::XrmError;

/// Pixel type declared by `ImageInfo/DataType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDataType {
    /// Unsigned 16-bit counts (code 5)
    U16,
    /// 32-bit float (code 10)
    F32,
}

impl ImageDataType {
    /// Map a container data type code.
    ///
    /// # Errors
    /// Returns `XrmError::UnsupportedDataType` for any other code.
    pub fn from_code(code: u32) -> Result<Self, XrmError> {
        match code {
            5 => Ok(ImageDataType::U16),
            10 => Ok(ImageDataType::F32),
            other => Err(XrmError::UnsupportedDataType(other)),
        }
    }

    /// The container code for this type.
    pub fn code(&self) -> u32 {
        match self {
            ImageDataType::U16 => 5,
            ImageDataType::F32 => 10,
        }
    }

    /// Bytes per pixel.
    pub fn byte_size(&self) -> usize {
        match self {
            ImageDataType::U16 => 2,
            ImageDataType::F32 => 4,
        }
    }

    /// Name written to the output `Data Type` field.
    pub fn name(&self) -> &'static str {
        match self {
            ImageDataType::U16 => "uint16",
            ImageDataType::F32 => "float32",
        }
    }
}

/// Declared frame shape and pixel type of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    /// Rows per frame (`ImageHeight`)
    pub rows: usize,
    /// Columns per frame (`ImageWidth`)
    pub cols: usize,
    /// Pixel type
    pub data_type: ImageDataType,
}

impl ImageGeometry {
    /// Byte length of one raw frame; `None` if it does not fit in `usize`.
    pub fn frame_bytes(&self) -> Option<usize> {
        self.rows
            .checked_mul(self.cols)?
            .checked_mul(self.data_type.byte_size())
    }

    /// Whether two geometries describe frames of the same shape.
    pub fn same_shape(&self, other: &ImageGeometry) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }
}

/// One decoded frame, row 0 at the physical top
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// uint16 pixels
    U16(Array2<u16>),
    /// float32 pixels
    F32(Array2<f32>),
}

impl Frame {
    /// `(rows, cols)` of the frame.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Frame::U16(a) => a.dim(),
            Frame::F32(a) => a.dim(),
        }
    }

    /// Pixel type of the frame.
    pub fn data_type(&self) -> ImageDataType {
        match self {
            Frame::U16(_) => ImageDataType::U16,
            Frame::F32(_) => ImageDataType::F32,
        }
    }

    /// Borrow as uint16 pixels, if that is the frame type.
    pub fn as_u16(&self) -> Option<ArrayView2<'_, u16>> {
        match self {
            Frame::U16(a) => Some(a.view()),
            Frame::F32(_) => None,
        }
    }

    /// Borrow as float32 pixels, if that is the frame type.
    pub fn as_f32(&self) -> Option<ArrayView2<'_, f32>> {
        match self {
            Frame::F32(a) => Some(a.view()),
            Frame::U16(_) => None,
        }
    }
}

/// Decode a raw frame.
///
/// The container stores rows bottom-up; the returned frame is flipped so that
/// row 0 is the top of the image.
pub fn decode_frame(bytes: &[u8], geometry: &ImageGeometry) -> Result<Frame, DecodeError> {
    let expected = geometry.frame_bytes().ok_or(DecodeError::FrameTooLarge {
        rows: geometry.rows,
        cols: geometry.cols,
    })?;
    if bytes.len() != expected {
        return Err(DecodeError::InvalidLength {
            expected,
            actual: bytes.len(),
        });
    }

    let shape = (geometry.rows, geometry.cols);
    let row_bytes = geometry.cols * geometry.data_type.byte_size();
    let pixels = geometry.rows * geometry.cols;
    let shape_error = |_| DecodeError::InvalidLength {
        expected,
        actual: bytes.len(),
    };

    // zero-width frames have no rows to iterate; chunks_exact rejects size 0
    if row_bytes == 0 {
        return Ok(match geometry.data_type {
            ImageDataType::U16 => Frame::U16(Array2::zeros(shape)),
            ImageDataType::F32 => Frame::F32(Array2::zeros(shape)),
        });
    }

    match geometry.data_type {
        ImageDataType::U16 => {
            let mut values = Vec::with_capacity(pixels);
            for row in bytes.chunks_exact(row_bytes).rev() {
                values.extend(row.chunks_exact(2).map(LittleEndian::read_u16));
            }
            Array2::from_shape_vec(shape, values)
                .map(Frame::U16)
                .map_err(shape_error)
        }
        ImageDataType::F32 => {
            let mut values = Vec::with_capacity(pixels);
            for row in bytes.chunks_exact(row_bytes).rev() {
                values.extend(row.chunks_exact(4).map(LittleEndian::read_f32));
            }
            Array2::from_shape_vec(shape, values)
                .map(Frame::F32)
                .map_err(shape_error)
        }
    }
}
