use super::*;
use crate::job::ResolvedJob;
use crate::xrm::{fields, ImageDataType, SyntheticXrm};
use hdf5::File;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn job_with(dir: &Path, sample: SyntheticXrm, bright: Option<SyntheticXrm>) -> ResolvedJob {
    let sample_path = dir.join("sample.txrm");
    sample.write(&sample_path).unwrap();
    let mut bright_paths: Vec<PathBuf> = Vec::new();
    if let Some(bright) = bright {
        let path = dir.join("bright.xrm");
        bright.write(&path).unwrap();
        bright_paths.push(path);
    }
    ResolvedJob::from_files(&[sample_path], &bright_paths, &[]).unwrap()
}

fn simple_job() -> (TempDir, ResolvedJob) {
    let dir = tempdir().unwrap();
    let job = job_with(
        dir.path(),
        SyntheticXrm::typical(4, 3, 3),
        Some(SyntheticXrm::typical(4, 3, 2)),
    );
    (dir, job)
}

fn write_all(path: &Path, job: &ResolvedJob) -> WriterStats {
    let mut writer = NexusWriter::create(path, WriterConfig::default()).unwrap();
    writer.write_metadata(job).unwrap();
    writer.write_images(job).unwrap();
    writer.link_canonical().unwrap();
    writer.close().unwrap()
}

// ==================== State Machine ====================

#[test]
fn test_full_sequence_states() {
    let (dir, job) = simple_job();
    let path = dir.path().join("out.hdf5");

    let mut writer = NexusWriter::create(&path, WriterConfig::default()).unwrap();
    assert_eq!(writer.state(), WriterState::Created);
    writer.write_metadata(&job).unwrap();
    assert_eq!(writer.state(), WriterState::MetadataWritten);
    writer.write_images(&job).unwrap();
    assert_eq!(writer.state(), WriterState::ImagesWritten);
    writer.link_canonical().unwrap();
    assert_eq!(writer.state(), WriterState::Linked);

    let stats = writer.close().unwrap();
    assert_eq!(writer.state(), WriterState::Closed);
    assert_eq!(stats.sample_frames, 3);
    assert_eq!(stats.bright_frames, 2);
    assert_eq!(stats.total_frames(), 5);
    assert!(stats.file_size_bytes > 0);
    assert!(!stats.dimension_mismatch);
}

#[test]
fn test_out_of_order_calls_rejected() {
    let (dir, job) = simple_job();
    let mut writer =
        NexusWriter::create(dir.path().join("out.hdf5"), WriterConfig::default()).unwrap();

    assert!(matches!(
        writer.write_images(&job),
        Err(NexusError::InvalidState {
            expected: WriterState::MetadataWritten,
            actual: WriterState::Created,
            ..
        })
    ));
    assert!(matches!(
        writer.link_canonical(),
        Err(NexusError::InvalidState { .. })
    ));

    writer.write_metadata(&job).unwrap();
    assert!(matches!(
        writer.write_metadata(&job),
        Err(NexusError::InvalidState { .. })
    ));
    assert!(matches!(
        writer.link_canonical(),
        Err(NexusError::InvalidState { .. })
    ));
}

#[test]
fn test_close_from_any_state() {
    let (dir, job) = simple_job();
    let path = dir.path().join("partial.hdf5");

    let mut writer = NexusWriter::create(&path, WriterConfig::default()).unwrap();
    writer.write_metadata(&job).unwrap();
    writer.close().unwrap();
    // second close is a no-op
    writer.close().unwrap();
    assert!(matches!(
        writer.write_images(&job),
        Err(NexusError::InvalidState {
            actual: WriterState::Closed,
            ..
        })
    ));

    // the partial file stays behind
    let file = File::open(&path).unwrap();
    assert!(file.link_exists("SpecNXtomo/instrument/sample/current"));
    assert!(!file.link_exists("SpecNXtomo/instrument/sample/data"));
}

// ==================== Overwrite Policy ====================

#[test]
fn test_overwrite_fail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("exists.hdf5");
    std::fs::write(&path, b"old").unwrap();

    let result = NexusWriter::create(&path, WriterConfig::default());
    assert!(matches!(result, Err(NexusError::AlreadyExists(_))));
    assert_eq!(std::fs::read(&path).unwrap(), b"old");
}

#[test]
fn test_overwrite_truncate() {
    let (dir, job) = simple_job();
    let path = dir.path().join("out.hdf5");
    write_all(&path, &job);

    let mut writer = NexusWriter::create(&path, WriterConfig::truncating()).unwrap();
    writer.close().unwrap();
    let file = File::open(&path).unwrap();
    assert!(!file.link_exists("SpecNXtomo/instrument/sample/data"));
}

// ==================== Content ====================

#[test]
fn test_metadata_units_and_values() {
    let (dir, job) = simple_job();
    let path = dir.path().join("out.hdf5");
    write_all(&path, &job);

    let file = File::open(&path).unwrap();
    let entry = file.group("SpecNXtomo").unwrap();
    let angles = entry.dataset("sample/rotation_angle").unwrap();
    assert_eq!(angles.read_raw::<f32>().unwrap(), vec![-70.0, -69.0, -68.0]);
    let units: hdf5::types::VarLenUnicode = angles.attr("units").unwrap().read_scalar().unwrap();
    assert_eq!(units.as_str(), "degrees");

    let distance = entry.dataset("instrument/sample/distance").unwrap();
    assert_eq!(distance.read_scalar::<f64>().unwrap(), 7600.0);

    let current = entry.dataset("instrument/bright_field/current").unwrap();
    assert_eq!(current.read_raw::<f32>().unwrap(), vec![250.0, 250.0]);

    let frames = entry
        .dataset("instrument/bright_field/Number of Frames")
        .unwrap();
    assert_eq!(frames.read_scalar::<u64>().unwrap(), 2);

    let monitor = entry.dataset("control/data").unwrap();
    assert_eq!(monitor.read_raw::<f32>().unwrap(), vec![1.0; 5]);

    let start: hdf5::types::VarLenUnicode = entry.dataset("start_time").unwrap().read_scalar().unwrap();
    assert_eq!(start.as_str(), "2024-01-15T10:30:00");
}

#[test]
fn test_sequence_number_continues_across_roles() {
    let (dir, job) = simple_job();
    let path = dir.path().join("out.hdf5");
    write_all(&path, &job);

    let file = File::open(&path).unwrap();
    let sample = file
        .dataset("SpecNXtomo/instrument/sample/sequence_number")
        .unwrap();
    let bright = file
        .dataset("SpecNXtomo/instrument/bright_field/sequence_number")
        .unwrap();
    assert_eq!(sample.read_raw::<u64>().unwrap(), vec![0, 1, 2]);
    assert_eq!(bright.read_raw::<u64>().unwrap(), vec![3, 4]);
}

#[test]
fn test_images_top_row_first() {
    let dir = tempdir().unwrap();
    let frame = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let job = job_with(
        dir.path(),
        SyntheticXrm::new(3, 2, 1).frames(vec![frame]),
        None,
    );
    let path = dir.path().join("out.hdf5");
    write_all(&path, &job);

    let file = File::open(&path).unwrap();
    let data = file
        .dataset("SpecNXtomo/instrument/sample/data")
        .unwrap()
        .read_raw::<u16>()
        .unwrap();
    assert_eq!(data, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_float_images_and_compression() {
    let dir = tempdir().unwrap();
    let job = job_with(
        dir.path(),
        SyntheticXrm::new(2, 2, 2)
            .data_type(ImageDataType::F32)
            .frames(vec![vec![0.5; 4], vec![1.5; 4]]),
        None,
    );
    let path = dir.path().join("out.hdf5");
    let mut writer = NexusWriter::create(&path, WriterConfig::compressed(4)).unwrap();
    writer.write_metadata(&job).unwrap();
    writer.write_images(&job).unwrap();
    writer.link_canonical().unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    let data = file.dataset("SpecNXtomo/data/data").unwrap();
    assert_eq!(data.shape(), vec![2, 2, 2]);
    assert_eq!(data.read_raw::<f32>().unwrap()[4], 1.5);
    let data_type: hdf5::types::VarLenUnicode = file
        .dataset("SpecNXtomo/instrument/sample/Data Type")
        .unwrap()
        .read_scalar()
        .unwrap();
    assert_eq!(data_type.as_str(), "float32");
}

#[test]
fn test_dimension_mismatch_is_not_fatal() {
    let dir = tempdir().unwrap();
    let job = job_with(
        dir.path(),
        SyntheticXrm::typical(4, 4, 2),
        Some(SyntheticXrm::typical(2, 2, 1)),
    );
    let path = dir.path().join("out.hdf5");
    let stats = write_all(&path, &job);

    assert!(stats.dimension_mismatch);
    let file = File::open(&path).unwrap();
    let bright = file
        .dataset("SpecNXtomo/instrument/bright_field/data")
        .unwrap();
    assert_eq!(bright.shape(), vec![1, 2, 2]);
    let width = file
        .dataset("SpecNXtomo/instrument/bright_field/Image Width")
        .unwrap();
    assert_eq!(width.read_scalar::<u64>().unwrap(), 2);
}

#[test]
fn test_zero_degree_images() {
    let dir = tempdir().unwrap();
    let initial = dir.path().join("zero_initial.xrm");
    let last = dir.path().join("zero_final.xrm");
    SyntheticXrm::new(4, 3, 1).write(&initial).unwrap();
    SyntheticXrm::new(4, 3, 1)
        .frames(vec![vec![7.0; 12]])
        .write(&last)
        .unwrap();
    let job = job_with(
        dir.path(),
        SyntheticXrm::typical(4, 3, 2),
        Some(SyntheticXrm::typical(4, 3, 1)),
    )
    .with_zero_degrees(&initial, &last);

    let path = dir.path().join("out.hdf5");
    let stats = write_all(&path, &job);
    assert_eq!(stats.zero_degree_images, 2);

    let file = File::open(&path).unwrap();
    let group = file.group("SpecNXtomo/instrument/sample").unwrap();
    assert_eq!(group.dataset("0_degrees_initial_image").unwrap().shape(), vec![4, 3]);
    let last = group
        .dataset("0_degrees_final_image")
        .unwrap()
        .read_raw::<u16>()
        .unwrap();
    assert_eq!(last, vec![7; 12]);
}

#[test]
fn test_custom_entry_name() {
    let (dir, job) = simple_job();
    let path = dir.path().join("out.hdf5");
    let config = WriterConfig {
        entry_name: "tomo".to_string(),
        ..WriterConfig::default()
    };
    let mut writer = NexusWriter::create(&path, config).unwrap();
    writer.write_metadata(&job).unwrap();
    writer.write_images(&job).unwrap();
    writer.link_canonical().unwrap();
    writer.close().unwrap();

    let file = File::open(&path).unwrap();
    assert!(file.link_exists("tomo/data/data"));
    assert!(!file.link_exists("SpecNXtomo"));
}

#[test]
fn test_missing_energy_skips_source_energy() {
    let dir = tempdir().unwrap();
    let job = job_with(
        dir.path(),
        SyntheticXrm::typical(2, 2, 1).without(fields::ENERGY),
        Some(SyntheticXrm::typical(2, 2, 1)),
    );
    let path = dir.path().join("out.hdf5");
    let stats = write_all(&path, &job);

    assert!(stats.metadata_skipped >= 1);
    let file = File::open(&path).unwrap();
    assert!(!file.link_exists("SpecNXtomo/instrument/source/energy"));
    assert!(file.link_exists("SpecNXtomo/instrument/source/name"));
}

#[test]
fn test_missing_sample_id_leaves_name_absent() {
    let dir = tempdir().unwrap();
    let job = job_with(
        dir.path(),
        SyntheticXrm::new(2, 2, 2),
        Some(SyntheticXrm::new(2, 2, 1)),
    );
    let path = dir.path().join("out.hdf5");
    let stats = write_all(&path, &job);

    assert!(stats.metadata_skipped >= 1);
    let file = File::open(&path).unwrap();
    assert!(!file.link_exists("SpecNXtomo/sample/name"));
    assert!(file.link_exists("SpecNXtomo/title"));
}

#[test]
fn test_sample_name_from_sample_id() {
    let (dir, job) = simple_job();
    let path = dir.path().join("out.hdf5");
    write_all(&path, &job);

    let file = File::open(&path).unwrap();
    let name: hdf5::types::VarLenUnicode = file
        .dataset("SpecNXtomo/sample/name")
        .unwrap()
        .read_scalar()
        .unwrap();
    assert_eq!(name.as_str(), "sample");
}

#[test]
fn test_canonical_data_is_a_hard_link() {
    let (dir, job) = simple_job();
    let path = dir.path().join("out.hdf5");
    write_all(&path, &job);

    let file = File::open(&path).unwrap();
    let stack = file.dataset("SpecNXtomo/instrument/sample/data").unwrap();
    let view = file.dataset("SpecNXtomo/data/data").unwrap();
    let stack_info = stack.loc_info().unwrap();
    let view_info = view.loc_info().unwrap();
    // one object reached through two names
    assert_eq!(stack_info.num_links, 2);
    assert_eq!(view_info.num_links, 2);
    assert!(stack_info.token == view_info.token);
}
