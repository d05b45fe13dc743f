//! Group names, dataset names, NeXus classes and units of the output.

use crate::organizer::Role;

/// `NX_class` attribute name
pub const NX_CLASS: &str = "NX_class";
/// Application definition written to `definition`
pub const DEFINITION: &str = "NXtomo";

/// `<entry>/instrument`
pub const INSTRUMENT: &str = "instrument";
/// `<entry>/instrument/source`
pub const SOURCE: &str = "source";
/// `<entry>/sample`
pub const SAMPLE: &str = "sample";
/// `<entry>/control`
pub const CONTROL: &str = "control";
/// `<entry>/data`
pub const DATA: &str = "data";

/// Image stack dataset inside each detector group, and the canonical link name
pub const IMAGES: &str = "data";
/// Running frame counter dataset
pub const SEQUENCE_NUMBER: &str = "sequence_number";
/// Zero-degree image taken before the sample series
pub const ZERO_DEGREES_INITIAL: &str = "0_degrees_initial_image";
/// Zero-degree image taken after the sample series
pub const ZERO_DEGREES_FINAL: &str = "0_degrees_final_image";

/// Degrees
pub const UNITS_DEGREES: &str = "degrees";
/// Electronvolts
pub const UNITS_EV: &str = "eV";
/// Milliamperes
pub const UNITS_MA: &str = "mA";
/// Seconds
pub const UNITS_SECONDS: &str = "s";
/// Micrometres
pub const UNITS_UM: &str = "um";

/// Detector group of a role under `instrument`.
pub fn role_group(role: Role) -> &'static str {
    match role {
        Role::Sample => "sample",
        Role::Bright => "bright_field",
        Role::Dark => "dark_field",
    }
}

/// Absolute path of the sample image stack.
pub fn sample_images_path(entry: &str) -> String {
    format!("/{entry}/{INSTRUMENT}/{}/{IMAGES}", role_group(Role::Sample))
}
