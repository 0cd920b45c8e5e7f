//! Bounded concurrent execution of per-year jobs.
//!
//! The listing is fetched once into shared immutable text before any worker
//! starts; each job exclusively owns its own transfer and extraction state,
//! so no lock is needed anywhere. Outcomes are collected in completion order
//! by the single aggregating task.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use stationsync_fetch::{HttpClient, ResumableFetcher, Result};

use crate::config::SyncConfig;
use crate::index;
use crate::job::{self, JobOutcome, JobStatus};

/// Aggregated result of one run, ordered by year.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<JobOutcome>,
}

impl RunSummary {
    pub fn count(&self, status: JobStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// One-line report: `2 done / 1 skipped / 1 not-found / 0 corrupted / 0 failed`.
    pub fn line(&self) -> String {
        format!(
            "{} done / {} skipped / {} not-found / {} corrupted / {} failed",
            self.count(JobStatus::Done),
            self.count(JobStatus::Skipped),
            self.count(JobStatus::NotFound),
            self.count(JobStatus::Corrupted),
            self.count(JobStatus::Failed),
        )
    }
}

/// Inclusive year range, swapped when inverted.
pub fn year_range(start: u16, end: u16) -> Vec<u16> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    (start..=end).collect()
}

/// Run one job per year through a worker pool of the given width.
///
/// Failure to fetch the listing is the only error surfaced here; every
/// per-year failure is folded into that year's outcome instead.
pub async fn run<C>(
    cfg: Arc<SyncConfig>,
    fetcher: Arc<ResumableFetcher<C>>,
    years: Vec<u16>,
    workers: usize,
) -> Result<RunSummary>
where
    C: HttpClient + 'static,
{
    let listing: Arc<str> = Arc::from(index::fetch_listing(fetcher.client(), &cfg.base_url).await?);
    info!(
        years = years.len(),
        workers,
        base_url = %cfg.base_url,
        "listing fetched, dispatching jobs"
    );

    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut set = JoinSet::new();
    for year in &years {
        let year = *year;
        let cfg = Arc::clone(&cfg);
        let fetcher = Arc::clone(&fetcher);
        let listing = Arc::clone(&listing);
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            job::run_year(&cfg, &fetcher, &listing, year).await
        });
    }

    let mut summary = RunSummary::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(outcome) => {
                info!("{outcome}");
                summary.outcomes.push(outcome);
            }
            Err(e) => error!(%e, "job task aborted"),
        }
    }

    if !cfg.keep_archives {
        cleanup_archives(&cfg, &summary.outcomes);
    }

    summary.outcomes.sort_by_key(|o| o.year);
    Ok(summary)
}

/// Delete source archives for successfully extracted years, matching both
/// naming patterns so no orphaned archive is left behind.
fn cleanup_archives(cfg: &SyncConfig, outcomes: &[JobOutcome]) {
    for outcome in outcomes {
        if outcome.status != JobStatus::Done {
            continue;
        }

        let plain = cfg.archive_path(&index::plain_name(outcome.year));
        if plain.is_file() {
            match std::fs::remove_file(&plain) {
                Ok(()) => info!(year = outcome.year, path = %plain.display(), "removed archive"),
                Err(e) => warn!(year = outcome.year, %e, "failed to remove archive"),
            }
        }

        let Ok(entries) = std::fs::read_dir(&cfg.raw_dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if index::is_decorated_name(name, outcome.year) {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => info!(year = outcome.year, name, "removed archive"),
                    Err(e) => warn!(year = outcome.year, %e, "failed to remove archive"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_is_swapped() {
        assert_eq!(year_range(2000, 1998), vec![1998, 1999, 2000]);
        assert_eq!(year_range(1998, 1998), vec![1998]);
    }
}
