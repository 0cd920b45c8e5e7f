use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// NCEI global-hourly yearly CSV archive listing.
pub const DEFAULT_BASE_URL: &str = "https://www.ncei.noaa.gov/data/global-hourly/archive/csv/";

/// Immutable run configuration, constructed once at startup and passed by
/// reference into the orchestrator and each component.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Listing endpoint; object URLs are `base_url + filename`.
    pub base_url: String,
    /// Downloaded archives (`.part` suffix while incomplete).
    pub raw_dir: PathBuf,
    /// Per-year extracted trees.
    pub extract_dir: PathBuf,
    /// Append-only run logs.
    pub report_dir: PathBuf,
    /// Attempt budget per transfer.
    pub retries: u32,
    /// Base delay for exponential backoff between transfer attempts.
    pub backoff_base: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Pacing sleep after each successful transfer, to throttle aggregate
    /// request rate against the remote server.
    pub pause_between_files: Duration,
    /// Keep source archives after successful extraction.
    pub keep_archives: bool,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>, data_root: &Path, keep_archives: bool) -> Self {
        Self {
            base_url: base_url.into(),
            raw_dir: data_root.join("raw"),
            extract_dir: data_root.join("extracted"),
            report_dir: data_root.join("reports"),
            retries: 8,
            backoff_base: Duration::from_millis(1500),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            pause_between_files: Duration::from_millis(1500),
            keep_archives,
        }
    }

    pub fn ensure_layout(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.raw_dir)?;
        std::fs::create_dir_all(&self.extract_dir)?;
        std::fs::create_dir_all(&self.report_dir)
    }

    pub fn object_url(&self, filename: &str) -> String {
        format!("{}{}", self.base_url, filename)
    }

    pub fn archive_path(&self, filename: &str) -> PathBuf {
        self.raw_dir.join(filename)
    }

    pub fn year_dir(&self, year: u16) -> PathBuf {
        self.extract_dir.join(year.to_string())
    }
}
