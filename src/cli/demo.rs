use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use xrm2nexus::organizer::{AcquisitionRecord, Role};
use xrm2nexus::xrm::{fields, SyntheticXrm};

const ROWS: usize = 64;
const COLS: usize = 48;
const DATE: &str = "20240115";
const SAMPLE: &str = "demo_cell";
const ENERGIES: [f64; 2] = [520.0, 525.5];
const FOCUS_POSITIONS: [f64; 2] = [-11.0, -10.5];

/// Write a synthetic acquisition set plus a batch manifest
pub fn run(output_dir: PathBuf, frames: usize) -> Result<()> {
    info!("xrm2nexus - synthetic acquisition demo");
    info!("======================================");

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let records = write_demo_set(&output_dir, frames.max(1))?;

    let manifest = output_dir.join("manifest.json");
    std::fs::write(&manifest, serde_json::to_string_pretty(&records)?)
        .with_context(|| format!("Failed to write {}", manifest.display()))?;

    info!("Demo set complete!");
    info!("  Files written: {}", records.len());
    info!("  Manifest: {}", manifest.display());
    info!(
        "\nConvert it with:\n  xrm2nexus batch {} -o {}",
        manifest.display(),
        output_dir.join("nexus").display()
    );

    Ok(())
}

fn write_demo_set(dir: &Path, frames: usize) -> Result<Vec<AcquisitionRecord>> {
    let mut records = Vec::new();
    let mut order_key = 0i64;

    for energy in ENERGIES {
        for focus in FOCUS_POSITIONS {
            let path = dir.join(format!("{DATE}_{SAMPLE}_{energy}eV_{focus}um.txrm"));
            let angles = (0..frames)
                .map(|i| -60.0 + 120.0 * i as f32 / frames as f32)
                .collect();
            SyntheticXrm::typical(ROWS, COLS, frames)
                .sample_id(SAMPLE)
                .per_frame(fields::ENERGY, vec![energy as f32; frames])
                .per_frame(fields::ANGLES, angles)
                .per_frame(fields::Z_POSITION, vec![focus as f32; frames])
                .write(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("  sample {}", path.display());
            records.push(record(path, Role::Sample, energy, Some(focus), order_key));
            order_key += 1;
        }

        for (role, suffix) in [(Role::Bright, "FF"), (Role::Dark, "DF")] {
            let path = dir.join(format!("{DATE}_{SAMPLE}_{energy}eV_{suffix}.xrm"));
            SyntheticXrm::typical(ROWS, COLS, 1)
                .sample_id(SAMPLE)
                .per_frame(fields::ENERGY, vec![energy as f32])
                .write(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("  {} {}", role, path.display());
            records.push(record(path, role, energy, None, order_key));
            order_key += 1;
        }
    }

    Ok(records)
}

fn record(
    path: PathBuf,
    role: Role,
    energy: f64,
    focus: Option<f64>,
    order_key: i64,
) -> AcquisitionRecord {
    AcquisitionRecord {
        path,
        role,
        date: DATE.to_string(),
        sample: SAMPLE.to_string(),
        energy,
        focus,
        repetition: 0,
        order_key,
    }
}
