//! On-disk artifacts of a run
//!
//! Three independent exports are written to the output directory:
//!
//! | Artifact | Format | Contents |
//! |----------|--------|----------|
//! | `links_<run>.jsonl` | JSON Lines | accepted links with their validation aggregate |
//! | `links_failed_<run>.json` | JSON | failing links with their per-check breakdown |
//! | `stats_<run>.json` | JSON | [`RunStatistics`] |
//!
//! Each file is written under a temporary name and renamed into place, so a
//! reader never sees a half-written artifact. A failing export is reported
//! in the [`ExportReport`] and never prevents the others.

use crate::{PipelineError, RunStatistics};
use lexlink_domain::ExtractedLink;
use lexlink_gatekeeper::{FailedReview, ValidatedLink};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

/// One line of the links export
#[derive(Debug, Serialize)]
pub struct LinkRecord<'a> {
    /// The accepted link
    #[serde(flatten)]
    pub link: &'a ExtractedLink,

    /// Aggregate validation score
    pub validation_score: f64,

    /// Whether the link passed the quality gate
    pub validation_passed: bool,
}

impl<'a> From<&'a ValidatedLink> for LinkRecord<'a> {
    fn from(validated: &'a ValidatedLink) -> Self {
        Self {
            link: &validated.link,
            validation_score: validated.validation.aggregate,
            validation_passed: validated.validation.passed,
        }
    }
}

/// Where the artifacts of one run go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Accepted links
    pub links: PathBuf,
    /// Failing links for manual review
    pub failed_review: PathBuf,
    /// Run statistics
    pub statistics: PathBuf,
}

impl ArtifactPaths {
    /// Artifact paths for `run_id` under `dir`
    pub fn for_run(dir: impl AsRef<Path>, run_id: Uuid) -> Self {
        let dir = dir.as_ref();
        Self {
            links: dir.join(format!("links_{}.jsonl", run_id)),
            failed_review: dir.join(format!("links_failed_{}.json", run_id)),
            statistics: dir.join(format!("stats_{}.json", run_id)),
        }
    }
}

/// Outcome of a single export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    /// The artifact was written
    Written {
        /// Final path
        path: PathBuf,
        /// Records written
        records: usize,
    },
    /// The artifact could not be written
    Failed {
        /// Intended path
        path: PathBuf,
        /// What went wrong
        error: String,
    },
}

impl ExportStatus {
    fn from_result(path: PathBuf, result: Result<usize, PipelineError>) -> Self {
        match result {
            Ok(records) => {
                info!(path = %path.display(), records, "Export written");
                ExportStatus::Written { path, records }
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Export failed");
                ExportStatus::Failed {
                    path,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Whether the artifact was written
    pub fn is_written(&self) -> bool {
        matches!(self, ExportStatus::Written { .. })
    }

    /// Path of the artifact
    pub fn path(&self) -> &Path {
        match self {
            ExportStatus::Written { path, .. } | ExportStatus::Failed { path, .. } => path,
        }
    }

    /// Failure message, if the export failed
    pub fn error(&self) -> Option<&str> {
        match self {
            ExportStatus::Written { .. } => None,
            ExportStatus::Failed { error, .. } => Some(error),
        }
    }
}

/// Outcome of all three exports of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Accepted links
    pub links: ExportStatus,
    /// Failing links for manual review
    pub failed_review: ExportStatus,
    /// Run statistics
    pub statistics: ExportStatus,
}

impl ExportReport {
    /// Whether every artifact was written
    pub fn all_written(&self) -> bool {
        self.links.is_written() && self.failed_review.is_written() && self.statistics.is_written()
    }

    /// Exports that failed, by artifact name
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        [
            ("links", &self.links),
            ("failed_review", &self.failed_review),
            ("statistics", &self.statistics),
        ]
        .into_iter()
        .filter_map(|(name, status)| status.error().map(|e| (name, e)))
        .collect()
    }
}

/// Write accepted links as JSON Lines; returns the number of records
pub fn export_results<'a>(
    links: impl IntoIterator<Item = &'a ValidatedLink>,
    path: impl AsRef<Path>,
) -> Result<usize, PipelineError> {
    write_atomic(path.as_ref(), |writer| {
        let mut count = 0;
        for validated in links {
            serde_json::to_writer(&mut *writer, &LinkRecord::from(validated))?;
            writer.write_all(b"\n")?;
            count += 1;
        }
        Ok(count)
    })
}

/// Write failing links with their per-check breakdown as a JSON array
pub fn export_failed_review(
    records: &[FailedReview],
    path: impl AsRef<Path>,
) -> Result<usize, PipelineError> {
    write_atomic(path.as_ref(), |writer| {
        serde_json::to_writer_pretty(&mut *writer, records)?;
        Ok(records.len())
    })
}

/// Write run statistics as JSON
pub fn save_statistics(
    statistics: &RunStatistics,
    path: impl AsRef<Path>,
) -> Result<(), PipelineError> {
    write_atomic(path.as_ref(), |writer| {
        serde_json::to_writer_pretty(&mut *writer, statistics)?;
        Ok(1)
    })
    .map(|_| ())
}

/// Write all three artifacts, reporting each outcome separately
pub fn export_all<'a>(
    paths: &ArtifactPaths,
    accepted: impl IntoIterator<Item = &'a ValidatedLink>,
    failed: &[FailedReview],
    statistics: &RunStatistics,
) -> ExportReport {
    let dir_error = paths
        .links
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .and_then(|dir| fs::create_dir_all(dir).err())
        .map(|e| e.to_string());

    if let Some(message) = dir_error {
        error!(error = %message, "Cannot create output directory");
        let unwritable = |path: &PathBuf| ExportStatus::Failed {
            path: path.clone(),
            error: format!("cannot create output directory: {}", message),
        };
        return ExportReport {
            links: unwritable(&paths.links),
            failed_review: unwritable(&paths.failed_review),
            statistics: unwritable(&paths.statistics),
        };
    }

    ExportReport {
        links: ExportStatus::from_result(paths.links.clone(), export_results(accepted, &paths.links)),
        failed_review: ExportStatus::from_result(
            paths.failed_review.clone(),
            export_failed_review(failed, &paths.failed_review),
        ),
        statistics: ExportStatus::from_result(
            paths.statistics.clone(),
            save_statistics(statistics, &paths.statistics).map(|_| 1),
        ),
    }
}

fn write_atomic<F>(path: &Path, write: F) -> Result<usize, PipelineError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<usize, PipelineError>,
{
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = File::create(&tmp_path)
        .map_err(PipelineError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            let count = write(&mut writer)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(count)
        })
        .and_then(|count| {
            fs::rename(&tmp_path, path)?;
            Ok(count)
        });

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
