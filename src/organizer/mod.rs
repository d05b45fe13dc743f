//! Partitioning of acquisition records into conversion jobs.
//!
//! Records are grouped by `(date, sample, energy)`. Within a group the
//! sample files are split by focus position or by repetition index, and
//! every resulting job shares the group's bright- and dark-field files.
//!
//! ```rust
//! use xrm2nexus::organizer::{organize, AcquisitionRecord, PartitionMode, Role};
//!
//! let record = |path: &str, role, focus| AcquisitionRecord {
//!     path: path.into(),
//!     role,
//!     date: "20240115".into(),
//!     sample: "s1".into(),
//!     energy: 520.0,
//!     focus,
//!     repetition: 0,
//!     order_key: 0,
//! };
//! let records = vec![
//!     record("a.xrm", Role::Sample, Some(10.0)),
//!     record("b.xrm", Role::Sample, Some(20.0)),
//!     record("ff.xrm", Role::Bright, None),
//! ];
//!
//! let jobs = organize(&records, PartitionMode::Focus);
//! assert_eq!(jobs.len(), 2);
//! assert!(jobs.iter().all(|job| job.bright.len() == 1));
//! ```

mod types;

pub use types::{AcquisitionJob, AcquisitionRecord, JobKey, Partition, PartitionMode, Role};

use std::collections::BTreeMap;

use log::{debug, warn};

use types::{quantize, ENERGY_STEPS};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    date: String,
    sample: String,
    energy_key: i64,
}

#[derive(Debug, Default)]
struct Group {
    samples: BTreeMap<Partition, Vec<AcquisitionRecord>>,
    bright: Vec<AcquisitionRecord>,
    dark: Vec<AcquisitionRecord>,
}

/// Partition records into jobs.
///
/// Every sample record lands in exactly one job. Jobs come out in key order
/// with each file list stably sorted by `order_key`. A sub-series without
/// bright-field files is kept and reported by
/// [`AcquisitionJob::is_skippable`]; groups holding only reference files
/// produce no job.
pub fn organize(records: &[AcquisitionRecord], mode: PartitionMode) -> Vec<AcquisitionJob> {
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();

    for record in records {
        let key = GroupKey {
            date: record.date.clone(),
            sample: record.sample.clone(),
            energy_key: quantize(record.energy, ENERGY_STEPS),
        };
        let group = groups.entry(key).or_default();
        match record.role {
            Role::Sample => group
                .samples
                .entry(Partition::of(record, mode))
                .or_default()
                .push(record.clone()),
            Role::Bright => group.bright.push(record.clone()),
            Role::Dark => group.dark.push(record.clone()),
        }
    }

    let mut jobs = Vec::new();
    for (group_key, mut group) in groups {
        if group.samples.is_empty() {
            warn!(
                "No sample files for {} {} {:.2} eV; {} reference file(s) unused",
                group_key.date,
                group_key.sample,
                group_key.energy_key as f64 / ENERGY_STEPS,
                group.bright.len() + group.dark.len()
            );
            continue;
        }

        group.bright.sort_by_key(|r| r.order_key);
        group.dark.sort_by_key(|r| r.order_key);

        for (partition, mut sample) in group.samples {
            sample.sort_by_key(|r| r.order_key);
            let job = AcquisitionJob {
                key: JobKey {
                    date: group_key.date.clone(),
                    sample: group_key.sample.clone(),
                    energy_key: group_key.energy_key,
                    partition,
                },
                sample,
                bright: group.bright.clone(),
                dark: group.dark.clone(),
            };
            if job.is_skippable() {
                warn!("Job {} has no bright-field files, marked skippable", job.key);
            }
            debug!(
                "Job {}: {} sample, {} bright, {} dark",
                job.key,
                job.sample.len(),
                job.bright.len(),
                job.dark.len()
            );
            jobs.push(job);
        }
    }

    jobs
}
