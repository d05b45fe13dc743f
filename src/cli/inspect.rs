use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use xrm2nexus::xrm::fields::{FieldLayout, KNOWN_FIELDS};
use xrm2nexus::xrm::{AxisLookup, AxisRole, XrmReader};

/// Print a JSON summary of one XRM/TXRM file
pub fn run(file: PathBuf) -> Result<()> {
    let summary = summarize(&file)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn summarize(path: &Path) -> Result<Value> {
    let mut reader =
        XrmReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut fields = Map::new();
    for spec in KNOWN_FIELDS {
        let layout = match spec.layout {
            FieldLayout::Scalar => "scalar",
            FieldLayout::PerFrame => "per_frame",
            FieldLayout::Text => "text",
            FieldLayout::Array => "array",
        };
        let present = reader.exists(spec.path);
        fields.insert(
            spec.path.to_string(),
            json!({ "layout": layout, "present": present }),
        );
    }

    // geometry and frame count are required; report the error instead of failing
    let geometry = match reader.geometry() {
        Ok(g) => json!({
            "rows": g.rows,
            "cols": g.cols,
            "data_type": g.data_type.name(),
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };
    let frame_count = match reader.frame_count() {
        Ok(n) => json!(n),
        Err(e) => json!({ "error": e.to_string() }),
    };

    let mut axes = Map::new();
    for role in AxisRole::ALL {
        let lookup = reader.lookup_axis(role)?;
        let status = match &lookup {
            AxisLookup::Found { .. } => "found",
            AxisLookup::FallbackByIndex(_) => "fallback_by_index",
            AxisLookup::Missing => "missing",
        };
        let value = match lookup.index() {
            Some(index) => reader.get_axis_value_at(index)?,
            None => None,
        };
        axes.insert(
            role.expected_name().to_string(),
            json!({
                "expected_index": role.expected_index(),
                "index": lookup.index(),
                "status": status,
                "value": value,
            }),
        );
    }

    Ok(json!({
        "path": path.display().to_string(),
        "sample_name": reader.sample_name()?,
        "dates": reader.dates()?,
        "frame_count": frame_count,
        "geometry": geometry,
        "pixel_size_um": reader.pixel_size()?,
        "magnification": reader.magnification()?,
        "distance_um": reader.get_distance()?,
        "axes": axes,
        "fields": fields,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use xrm2nexus::xrm::fields;
    use xrm2nexus::xrm::SyntheticXrm;

    #[test]
    fn test_summary_of_typical_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.txrm");
        SyntheticXrm::typical(4, 3, 2).write(&path).unwrap();

        let summary = summarize(&path).unwrap();
        assert_eq!(summary["frame_count"], json!(2));
        assert_eq!(summary["geometry"]["rows"], json!(4));
        assert_eq!(summary["geometry"]["data_type"], json!("uint16"));
        assert_eq!(summary["distance_um"], json!(7600.0));
        assert_eq!(summary["axes"]["DetEnc"]["status"], json!("found"));
        assert_eq!(summary["fields"][fields::ANGLES]["present"], json!(true));
    }

    #[test]
    fn test_summary_reports_absent_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bare.xrm");
        SyntheticXrm::new(2, 2, 1).write(&path).unwrap();

        let summary = summarize(&path).unwrap();
        assert_eq!(summary["fields"][fields::PIXEL_SIZE]["present"], json!(false));
        assert_eq!(summary["pixel_size_um"], Value::Null);
        assert_eq!(summary["axes"]["SampleEnc"]["status"], json!("missing"));
    }
}
