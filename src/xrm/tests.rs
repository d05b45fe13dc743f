use super::*;
use tempfile::tempdir;

fn reader_for(builder: &SyntheticXrm) -> XrmReader<MemoryRecordSource> {
    XrmReader::from_source(builder.to_memory_source(), "memory.txrm")
}

// ==================== Scalars and Probes ====================

#[test]
fn test_frame_count_and_geometry() {
    let mut reader = reader_for(&SyntheticXrm::new(4, 3, 5));

    assert_eq!(reader.frame_count().unwrap(), 5);
    let geometry = reader.geometry().unwrap();
    assert_eq!(geometry.rows, 4);
    assert_eq!(geometry.cols, 3);
    assert_eq!(geometry.data_type, ImageDataType::U16);
}

#[test]
fn test_missing_required_field() {
    let mut source = SyntheticXrm::new(2, 2, 1).to_memory_source();
    source.remove(fields::IMAGE_WIDTH);
    let mut reader = XrmReader::from_source(source, "memory.xrm");

    match reader.geometry() {
        Err(XrmError::FieldAbsent(field)) => assert_eq!(field, fields::IMAGE_WIDTH),
        other => panic!("expected FieldAbsent, got {:?}", other),
    }
}

#[test]
fn test_absent_optional_field_is_none() {
    let mut reader = reader_for(&SyntheticXrm::typical(2, 2, 1).without_pixel_size());

    assert!(!reader.exists(fields::PIXEL_SIZE));
    assert_eq!(reader.pixel_size().unwrap(), None);
    assert_eq!(reader.magnification().unwrap(), Some(1500.0));
}

#[test]
fn test_text_fields() {
    let builder = SyntheticXrm::typical(2, 2, 2).date("01/15/24 10:31:00");
    let mut reader = reader_for(&builder);

    assert_eq!(reader.sample_name().unwrap().as_deref(), Some("sample"));
    assert_eq!(
        reader.dates().unwrap(),
        vec!["01/15/24 10:30:00".to_string(), "01/15/24 10:31:00".to_string()]
    );
}

#[test]
fn test_scalar_too_short() {
    let source = SyntheticXrm::new(2, 2, 1)
        .to_memory_source()
        .with(fields::PIXEL_SIZE, vec![0u8, 1]);
    let mut reader = XrmReader::from_source(source, "memory.xrm");

    assert!(matches!(
        reader.pixel_size(),
        Err(XrmError::FieldDecode { .. })
    ));
}

// ==================== Per-frame Arrays ====================

#[test]
fn test_per_frame_contiguous() {
    let angles = vec![-60.0, 0.0, 60.0];
    let builder = SyntheticXrm::new(2, 2, 3).per_frame(fields::ANGLES, angles.clone());
    let mut reader = reader_for(&builder);

    assert_eq!(reader.get_per_frame_array(fields::ANGLES, 3).unwrap(), angles);
}

#[test]
fn test_per_frame_padded_stride_fallback() {
    let energies = vec![520.5, 521.0, 521.5, 522.0];
    let builder = SyntheticXrm::new(2, 2, 4).per_frame_with(
        fields::ENERGY,
        energies.clone(),
        DecodeStrategy::padded_stride(),
    );
    let mut reader = reader_for(&builder);

    let decoded = reader.get_per_frame_array(fields::ENERGY, 4).unwrap();
    assert_eq!(decoded[0], 520.5);
    assert_eq!(decoded, energies);

    // the contiguous strategy alone rejects the padded record
    assert!(matches!(
        reader.get_per_frame_array_with(fields::ENERGY, 4, DecodeStrategy::Contiguous),
        Err(XrmError::FieldDecode { .. })
    ));
}

#[test]
fn test_per_frame_no_layout_matches() {
    let source = SyntheticXrm::new(2, 2, 3)
        .to_memory_source()
        .with(fields::CURRENT, vec![0u8; 7]);
    let mut reader = XrmReader::from_source(source, "memory.txrm");

    assert!(matches!(
        reader.get_per_frame_array(fields::CURRENT, 3),
        Err(XrmError::FieldDecode { .. })
    ));
}

#[test]
fn test_absent_per_frame_array_is_none() {
    let mut reader = reader_for(&SyntheticXrm::new(2, 2, 3));
    assert_eq!(reader.probe_per_frame_array(fields::EXP_TIMES, 3).unwrap(), None);
}

// ==================== Axes and Distance ====================

#[test]
fn test_axis_values() {
    let mut reader = reader_for(&SyntheticXrm::typical(2, 2, 1));

    assert!(reader.lookup_axis(AxisRole::Energy).unwrap().is_verified());
    assert_eq!(reader.get_axis_value(AxisRole::Energy).unwrap(), Some(520.0));
    assert_eq!(
        reader.get_axis_value(AxisRole::MachineCurrent).unwrap(),
        Some(250.0)
    );
}

#[test]
fn test_distance() {
    let builder = SyntheticXrm::new(2, 2, 1).standard_axes(100.0, 2.5, 5000.0);
    let mut reader = reader_for(&builder);

    // 100 um zero + 2.5 mm detector + 5000 um sample
    assert_eq!(reader.get_distance().unwrap(), Some(7600.0));
}

#[test]
fn test_distance_unverified_axis() {
    let mut names: Vec<String> = (0..45).map(|i| format!("Axis{i}")).collect();
    names[26] = "SampleEnc".to_string();
    let positions = vec![1.0; 45];
    let builder = SyntheticXrm::new(2, 2, 1)
        .standard_axes(100.0, 2.5, 5000.0)
        .axes(names, positions);
    let mut reader = reader_for(&builder);

    assert_eq!(
        reader.lookup_axis(AxisRole::DetectorEncoder).unwrap(),
        AxisLookup::FallbackByIndex(27)
    );
    // raw indexed value still available
    assert_eq!(reader.get_axis_value_at(27).unwrap(), Some(1.0));
    assert_eq!(reader.get_distance().unwrap(), None);
}

#[test]
fn test_distance_without_calibration() {
    let mut source = SyntheticXrm::typical(2, 2, 1).to_memory_source();
    source.remove(fields::DET_ZERO);
    let mut reader = XrmReader::from_source(source, "memory.xrm");

    assert_eq!(reader.get_distance().unwrap(), None);
}

#[test]
fn test_no_axis_table() {
    let mut reader = reader_for(&SyntheticXrm::new(2, 2, 1));

    assert!(reader.get_axis_names().unwrap().is_empty());
    assert_eq!(reader.lookup_axis(AxisRole::Energy).unwrap(), AxisLookup::Missing);
    assert_eq!(reader.get_distance().unwrap(), None);
}

// ==================== Images ====================

#[test]
fn test_image_top_row_first() {
    // top-down pattern: row r holds r * 10 + c
    let rows = 4;
    let cols = 3;
    let frame: Vec<f32> = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| (r * 10 + c) as f32))
        .collect();
    let builder = SyntheticXrm::new(rows, cols, 1).frames(vec![frame]);

    // raw storage starts with the bottom row
    let raw = builder.records()[&fields::image_stream_path(0)].clone();
    assert_eq!(u16::from_le_bytes([raw[0], raw[1]]), 30);

    let mut reader = reader_for(&builder);
    let image = reader.get_image(0).unwrap();
    let view = image.as_u16().unwrap();
    assert_eq!(view.row(0).to_vec(), vec![0, 1, 2]);
    assert_eq!(view.row(3).to_vec(), vec![30, 31, 32]);
}

#[test]
fn test_image_float_type() {
    let builder = SyntheticXrm::new(2, 2, 1)
        .data_type(ImageDataType::F32)
        .frames(vec![vec![0.5, 1.5, 2.5, 3.5]]);
    let mut reader = reader_for(&builder);

    let image = reader.get_image(0).unwrap();
    assert_eq!(image.data_type(), ImageDataType::F32);
    assert_eq!(image.as_f32().unwrap()[[1, 1]], 3.5);
}

#[test]
fn test_image_second_bucket() {
    let frames = (0..102).map(|f| vec![f as f32, 0.0]).collect();
    let mut reader = reader_for(&SyntheticXrm::new(1, 2, 102).frames(frames));

    assert_eq!(reader.get_image(99).unwrap().as_u16().unwrap()[[0, 0]], 99);
    assert_eq!(reader.get_image(101).unwrap().as_u16().unwrap()[[0, 0]], 101);
}

#[test]
fn test_image_out_of_range() {
    let mut reader = reader_for(&SyntheticXrm::new(2, 2, 3));

    assert!(matches!(
        reader.get_image(3),
        Err(XrmError::FrameOutOfRange { index: 3, count: 3 })
    ));
}

#[test]
fn test_image_stream_missing() {
    let mut source = SyntheticXrm::new(2, 2, 2).to_memory_source();
    source.remove(&fields::image_stream_path(1));
    let mut reader = XrmReader::from_source(source, "memory.txrm");

    assert!(reader.get_image(0).is_ok());
    assert!(matches!(reader.get_image(1), Err(XrmError::FieldAbsent(_))));
}

#[test]
fn test_unsupported_data_type() {
    let source = SyntheticXrm::new(2, 2, 1)
        .to_memory_source()
        .with(fields::DATA_TYPE, 3u32.to_le_bytes().to_vec());
    let mut reader = XrmReader::from_source(source, "memory.xrm");

    assert!(matches!(
        reader.get_image(0),
        Err(XrmError::UnsupportedDataType(3))
    ));
}

#[test]
fn test_corrupt_geometry_is_a_decode_error() {
    let source = SyntheticXrm::new(2, 2, 1)
        .to_memory_source()
        .with(fields::IMAGE_HEIGHT, u32::MAX.to_le_bytes().to_vec())
        .with(fields::IMAGE_WIDTH, u32::MAX.to_le_bytes().to_vec());
    let mut reader = XrmReader::from_source(source, "memory.xrm");

    assert!(matches!(
        reader.get_image(0),
        Err(XrmError::FieldDecode {
            source: DecodeError::FrameTooLarge { .. },
            ..
        })
    ));
}

// ==================== Compound File Round Trip ====================

#[test]
fn test_compound_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tomo.txrm");
    SyntheticXrm::typical(3, 2, 2)
        .per_frame_with(
            fields::EXP_TIMES,
            vec![0.5, 2.0],
            DecodeStrategy::padded_stride(),
        )
        .write(&path)
        .unwrap();

    let mut reader = XrmReader::open(&path).unwrap();
    assert_eq!(reader.path(), path.as_path());
    assert_eq!(reader.frame_count().unwrap(), 2);
    assert_eq!(reader.sample_name().unwrap().as_deref(), Some("sample"));
    assert_eq!(
        reader.get_per_frame_array(fields::EXP_TIMES, 2).unwrap(),
        vec![0.5, 2.0]
    );
    assert_eq!(reader.get_distance().unwrap(), Some(7600.0));
    assert_eq!(reader.get_image(1).unwrap().dim(), (3, 2));
    reader.close();
}

#[test]
fn test_io_error_conversion() {
    let err: XrmError = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into();
    assert!(matches!(err, XrmError::IoError(_)));
    assert!(err.to_string().starts_with("I/O error"));
}
