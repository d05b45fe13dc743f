//! Motor axis lookup in the `PositionInfo` name table.
//!
//! `PositionInfo/MotorPositions` holds one value per entry of
//! `PositionInfo/AxisNames`. The axes we need sit at known positions in the
//! table, but the table layout differs between firmware revisions, so every
//! positional index is checked against the name expected there.

use log::warn;

/// Motor axes the converter reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    /// Sample stage encoder along the beam
    SampleEncoder,
    /// Detector stage encoder along the beam (mm)
    DetectorEncoder,
    /// Monochromator energy setpoint
    Energy,
    /// Storage ring current
    MachineCurrent,
    /// Monochromator energy encoder readback
    EnergyEncoder,
}

impl AxisRole {
    /// All roles, in table order.
    pub const ALL: [AxisRole; 5] = [
        AxisRole::SampleEncoder,
        AxisRole::DetectorEncoder,
        AxisRole::Energy,
        AxisRole::MachineCurrent,
        AxisRole::EnergyEncoder,
    ];

    /// Index at which the axis is expected in the name table.
    pub fn expected_index(&self) -> usize {
        match self {
            AxisRole::SampleEncoder => 26,
            AxisRole::DetectorEncoder => 27,
            AxisRole::Energy => 35,
            AxisRole::MachineCurrent => 38,
            AxisRole::EnergyEncoder => 40,
        }
    }

    /// Name the axis carries in the name table.
    pub fn expected_name(&self) -> &'static str {
        match self {
            AxisRole::SampleEncoder => "SampleEnc",
            AxisRole::DetectorEncoder => "DetEnc",
            AxisRole::Energy => "Energy",
            AxisRole::MachineCurrent => "MachineCurrent",
            AxisRole::EnergyEncoder => "EnergyEnc",
        }
    }
}

/// Outcome of looking up an axis in the name table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisLookup {
    /// The expected name was found at `index`
    Found {
        /// Name found in the table
        name: String,
        /// Position in the table
        index: usize,
    },
    /// The name was not found; the expected index exists but is unverified
    FallbackByIndex(usize),
    /// Neither the name nor the expected index is present
    Missing,
}

impl AxisLookup {
    /// Index to read a motor value from, verified or not.
    pub fn index(&self) -> Option<usize> {
        match self {
            AxisLookup::Found { index, .. } => Some(*index),
            AxisLookup::FallbackByIndex(index) => Some(*index),
            AxisLookup::Missing => None,
        }
    }

    /// Whether the name at the index was verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, AxisLookup::Found { .. })
    }
}

/// Resolve an axis against a name table.
///
/// The name at the expected index is checked first. If it does not match,
/// the whole table is searched for the name. Mismatches are logged.
pub fn lookup_axis(names: &[String], role: AxisRole) -> AxisLookup {
    let expected_index = role.expected_index();
    let expected_name = role.expected_name();

    if names.get(expected_index).map(String::as_str) == Some(expected_name) {
        return AxisLookup::Found {
            name: expected_name.to_string(),
            index: expected_index,
        };
    }

    if let Some(index) = names.iter().position(|n| n == expected_name) {
        warn!(
            "Axis {} found at index {} instead of {}",
            expected_name, index, expected_index
        );
        return AxisLookup::Found {
            name: expected_name.to_string(),
            index,
        };
    }

    match names.get(expected_index) {
        Some(actual) => {
            warn!(
                "Axis name mismatch at index {}: expected {}, found {}",
                expected_index, expected_name, actual
            );
            AxisLookup::FallbackByIndex(expected_index)
        }
        None => {
            warn!(
                "Axis {} not present (table has {} names)",
                expected_name,
                names.len()
            );
            AxisLookup::Missing
        }
    }
}
