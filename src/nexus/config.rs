/// What to do when the output path already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Refuse with `NexusError::AlreadyExists`
    #[default]
    Fail,
    /// Replace the existing file
    Truncate,
}

/// Description of the light source and beamline written to every entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityInfo {
    /// `instrument/source/name`
    pub source_name: String,
    /// `instrument/source/type`
    pub source_type: String,
    /// `instrument/source/probe`
    pub probe: String,
    /// `instrument/name`
    pub instrument_name: String,
}

impl Default for FacilityInfo {
    fn default() -> Self {
        Self {
            source_name: "ALBA".to_string(),
            source_type: "Synchrotron X-ray Source".to_string(),
            probe: "x-ray".to_string(),
            instrument_name: "BL09 @ ALBA".to_string(),
        }
    }
}

/// Configuration for the NeXus writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Name of the `NXentry` group
    pub entry_name: String,

    /// Behaviour when the output exists
    pub overwrite: OverwritePolicy,

    /// Deflate level (0-9) for image datasets; `None` stores them raw
    pub compression: Option<u8>,

    /// Source and instrument description
    pub facility: FacilityInfo,

    /// `program_name` dataset value
    pub program_name: String,

    /// `program_name@configuration` attribute value
    pub program_configuration: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            entry_name: "SpecNXtomo".to_string(),
            overwrite: OverwritePolicy::Fail,
            compression: None,
            facility: FacilityInfo::default(),
            program_name: env!("CARGO_PKG_NAME").to_string(),
            program_configuration: "default".to_string(),
        }
    }
}

impl WriterConfig {
    /// Default configuration that replaces existing outputs.
    pub fn truncating() -> Self {
        Self {
            overwrite: OverwritePolicy::Truncate,
            ..Self::default()
        }
    }

    /// Default configuration with deflate compression of the image datasets.
    pub fn compressed(level: u8) -> Self {
        Self {
            compression: Some(level.min(9)),
            ..Self::default()
        }
    }
}
