use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use xrm2nexus::convert::write_job;
use xrm2nexus::job::ResolvedJob;

use super::{Config, OutputArgs};

/// Convert explicit sample/bright/dark file lists into one NeXus file
pub fn run(
    output: PathBuf,
    sample: Vec<PathBuf>,
    bright: Vec<PathBuf>,
    dark: Vec<PathBuf>,
    zero_degrees: Option<Vec<PathBuf>>,
    title: Option<String>,
    output_args: OutputArgs,
) -> Result<()> {
    for input in sample.iter().chain(&bright).chain(&dark) {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }

    let config = Config::load(&output_args)?;
    let writer_config = config.writer_config(&output_args);

    info!("xrm2nexus - XRM/TXRM to NeXus");
    info!("=============================");
    info!("Sample files: {}", sample.len());
    info!("Bright-field files: {}", bright.len());
    info!("Dark-field files: {}", dark.len());
    info!("Output: {}", output.display());
    info!("Entry: {}", writer_config.entry_name);

    let title = title.unwrap_or_else(|| {
        output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| writer_config.entry_name.clone())
    });

    let mut job = ResolvedJob::from_files(&sample, &bright, &dark)
        .context("Failed to read input metadata")?
        .with_title(title);
    if let Some([initial, last]) = zero_degrees.as_deref() {
        job = job.with_zero_degrees(initial, last);
    }

    let stats = write_job(&output, &job, writer_config).context("Conversion failed")?;

    info!("Conversion complete!");
    info!("  {}", stats);
    info!(
        "  Output file size: {} bytes ({:.2} MB)",
        stats.file_size_bytes,
        stats.file_size_bytes as f64 / 1024.0 / 1024.0
    );

    Ok(())
}
