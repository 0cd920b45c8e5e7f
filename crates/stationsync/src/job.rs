//! One year's resolve → transfer → verify → extract pipeline.
//!
//! Every failure is scoped to the year: `run_year` always returns an outcome
//! and never aborts sibling jobs. Idempotence of each stage lets a fresh run
//! fast-forward through work a previous run already finished.

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use stationsync_archive as archive;
use stationsync_fetch::{HttpClient, ResumableFetcher};

use crate::config::SyncConfig;
use crate::index;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Archive fetched (or found), verified and extracted this run.
    Done,
    /// A previous run already extracted this year to completion.
    Skipped,
    /// The listing has no archive for this year; not an error.
    NotFound,
    /// The local archive failed structural verification and was deleted.
    Corrupted,
    /// Transfer, verification or extraction failed for this year only.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::NotFound => "not-found",
            Self::Corrupted => "corrupted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one year's job; the unit of aggregation.
#[derive(Clone, Debug)]
pub struct JobOutcome {
    pub year: u16,
    pub status: JobStatus,
    pub detail: String,
    pub files: usize,
}

impl JobOutcome {
    fn new(year: u16, status: JobStatus, detail: impl Into<String>, files: usize) -> Self {
        Self {
            year,
            status,
            detail: detail.into(),
            files,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: year {}, {}", self.status, self.year, self.detail)
    }
}

/// Top-level regular files in a populated year directory, marker excluded.
fn count_extracted(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| e.file_name() != archive::COMPLETION_MARKER)
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}

/// Drive one year from `Pending` to a terminal status.
pub async fn run_year<C: HttpClient>(
    cfg: &SyncConfig,
    fetcher: &ResumableFetcher<C>,
    listing: &str,
    year: u16,
) -> JobOutcome {
    let year_dir = cfg.year_dir(year);

    // Job-level short-circuit: a completion marker means no network request
    // and no archive open are needed at all.
    if archive::is_complete(&year_dir) {
        let files = count_extracted(&year_dir);
        return JobOutcome::new(
            year,
            JobStatus::Skipped,
            format!("already extracted ({files} files)"),
            files,
        );
    }

    let Some(filename) = index::resolve_filename(listing, year) else {
        return JobOutcome::new(year, JobStatus::NotFound, "not found in listing", 0);
    };

    let url = cfg.object_url(&filename);
    let archive_path = cfg.archive_path(&filename);

    if archive_path.is_file() {
        debug!(year, archive = %archive_path.display(), "found existing archive, skipping download");
    } else {
        info!(year, %url, "downloading");
        if let Err(e) = fetcher.fetch_with_retry(&url, &archive_path).await {
            return JobOutcome::new(year, JobStatus::Failed, format!("download failed: {e}"), 0);
        }
        tokio::time::sleep(cfg.pause_between_files).await;
    }

    // Re-verify even a cached archive before trusting it.
    let verify_path = archive_path.clone();
    let verified = tokio::task::spawn_blocking(move || archive::verify(&verify_path)).await;
    match verified {
        Ok(Ok(())) => {}
        Ok(Err(_)) => {
            let size = std::fs::metadata(&archive_path).map(|m| m.len()).unwrap_or(0);
            // Delete so the next run retries the download instead of looping
            // on the same bad file.
            let _ = std::fs::remove_file(&archive_path);
            return JobOutcome::new(
                year,
                JobStatus::Corrupted,
                format!("corrupted archive removed ({size} bytes); re-run to retry"),
                0,
            );
        }
        Err(e) => {
            return JobOutcome::new(year, JobStatus::Failed, format!("verification failed: {e}"), 0);
        }
    }

    let extract_archive = archive_path.clone();
    let extract_dir = year_dir.clone();
    let extracted =
        tokio::task::spawn_blocking(move || archive::extract(&extract_archive, &extract_dir)).await;
    match extracted {
        Ok(Ok(report)) => JobOutcome::new(
            year,
            JobStatus::Done,
            format!("extracted {} files", report.files()),
            report.files(),
        ),
        Ok(Err(e)) => {
            JobOutcome::new(year, JobStatus::Failed, format!("extraction failed: {e}"), 0)
        }
        Err(e) => JobOutcome::new(year, JobStatus::Failed, format!("extraction failed: {e}"), 0),
    }
}
