use anyhow::{Context, Result};
use log::{error, info};
#[cfg(not(feature = "parallel"))]
use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use xrm2nexus::convert::{convert_job, ConvertError};
use xrm2nexus::nexus::{WriterConfig, WriterStats};
use xrm2nexus::organizer::{organize, AcquisitionJob, AcquisitionRecord, PartitionMode};

use super::{Config, OutputArgs};

/// Tally of a batch run
#[derive(Debug, Default)]
struct BatchSummary {
    converted: usize,
    skipped: usize,
    failed: usize,
    frames: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Result<(PathBuf, WriterStats), ConvertError>) {
        match outcome {
            Ok((_, stats)) => {
                self.converted += 1;
                self.frames += stats.total_frames();
            }
            Err(e) if e.is_skip() => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} converted ({} frames), {} skipped, {} failed",
            self.converted, self.frames, self.skipped, self.failed
        )
    }
}

/// Read a manifest of acquisition records.
pub fn load_manifest(path: &Path) -> Result<Vec<AcquisitionRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Organize a manifest into jobs and convert each into `output_dir`
pub fn run(
    manifest: PathBuf,
    output_dir: PathBuf,
    by: Option<PartitionMode>,
    parallel: bool,
    output_args: OutputArgs,
) -> Result<()> {
    let config = Config::load(&output_args)?;
    let writer_config = config.writer_config(&output_args);
    let mode = by.or(config.organize.by).unwrap_or_default();
    let parallel = parallel || config.organize.parallel.unwrap_or(false);

    let records = load_manifest(&manifest)?;
    info!("Read {} acquisition records", records.len());

    let jobs = organize(&records, mode);
    info!("Organized into {} jobs ({:?} mode)", jobs.len(), mode);

    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    ensure_unique_outputs(&jobs, &output_dir)?;
    let outcomes = convert_all(&jobs, &output_dir, &writer_config, parallel);

    let mut summary = BatchSummary::default();
    for (job, outcome) in jobs.iter().zip(&outcomes) {
        match outcome {
            Ok((path, stats)) => info!("{} -> {}: {}", job.key, path.display(), stats),
            Err(e) if e.is_skip() => info!("{}: skipped", job.key),
            Err(e) => error!("{}: {}", job.key, e),
        }
        summary.record(outcome);
    }

    info!("Batch complete: {}", summary);
    if summary.failed > 0 {
        anyhow::bail!("{} of {} jobs failed", summary.failed, jobs.len());
    }
    Ok(())
}

/// Refuse a batch in which two jobs would write the same file.
fn ensure_unique_outputs(jobs: &[AcquisitionJob], output_dir: &Path) -> Result<()> {
    let mut seen: HashMap<PathBuf, &AcquisitionJob> = HashMap::new();
    for job in jobs {
        let path = output_dir.join(job.key.output_file_name());
        if let Some(previous) = seen.insert(path.clone(), job) {
            anyhow::bail!(
                "Jobs '{}' and '{}' both write {}",
                previous.key,
                job.key,
                path.display()
            );
        }
    }
    Ok(())
}

fn convert_all(
    jobs: &[AcquisitionJob],
    output_dir: &Path,
    config: &WriterConfig,
    parallel: bool,
) -> Vec<Result<(PathBuf, WriterStats), ConvertError>> {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;
            return jobs
                .par_iter()
                .map(|job| convert_job(job, output_dir, config.clone()))
                .collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        if parallel {
            warn!("Parallel conversion requested but binary was built without the parallel feature; converting sequentially.");
        }
    }

    jobs.iter()
        .map(|job| convert_job(job, output_dir, config.clone()))
        .collect()
}
