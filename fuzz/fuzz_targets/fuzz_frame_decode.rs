#![no_main]

use libfuzzer_sys::fuzz_target;
use xrm2nexus::xrm::image::decode_frame;
use xrm2nexus::xrm::{ImageDataType, ImageGeometry};

const HEADER: usize = 9;

fn read_u32(bytes: &[u8]) -> usize {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
}

fuzz_target!(|data: &[u8]| {
    // Header: u32 rows, u32 cols, data type selector; the rest is the raw frame
    if data.len() < HEADER {
        return;
    }
    let data_type = if data[8] % 2 == 0 {
        ImageDataType::U16
    } else {
        ImageDataType::F32
    };
    let geometry = ImageGeometry {
        rows: read_u32(&data[0..4]),
        cols: read_u32(&data[4..8]),
        data_type,
    };

    if let Ok(frame) = decode_frame(&data[HEADER..], &geometry) {
        assert_eq!(frame.dim(), (geometry.rows, geometry.cols));
    }
});
