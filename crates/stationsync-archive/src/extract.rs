use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::warn;

use crate::error::{Error, Result};
use crate::sanitize::sanitize_entry_path;

/// Marker written into the output root after a fully successful pass.
///
/// Its presence distinguishes "fully extracted" from "interrupted mid-archive",
/// which mere directory non-emptiness cannot.
pub const COMPLETION_MARKER: &str = ".stationsync-complete";

/// Outcome of one extraction pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Regular files written by this pass.
    pub files_written: usize,
    /// Regular files already present with matching size, left untouched.
    pub files_existing: usize,
    /// Members rejected because their path would escape the output root.
    pub skipped_unsafe: usize,
    /// Symlinks, devices and other non-file non-directory members.
    pub skipped_special: usize,
}

impl ExtractionReport {
    /// Total regular files materialized under the output root.
    pub fn files(&self) -> usize {
        self.files_written + self.files_existing
    }
}

/// True when a previous run extracted this root to completion.
pub fn is_complete<P: AsRef<Path>>(output_root: P) -> bool {
    output_root.as_ref().join(COMPLETION_MARKER).is_file()
}

fn mark_complete(output_root: &Path) -> io::Result<()> {
    fs::write(output_root.join(COMPLETION_MARKER), b"")
}

/// Extract a `.tar.gz` archive under `output_root`, streaming member by member.
///
/// The member list is never materialized in memory; archives may hold hundreds
/// of thousands of entries. Every member path is sanitized before any write.
/// An unsafe member is logged and skipped without aborting the archive, as is
/// any special-typed member. A destination file that already exists with the
/// member's exact size counts as materialized, which makes repeated runs
/// idempotent without a separate manifest. Only an unreadable archive stream
/// fails the whole call.
pub fn extract<P: AsRef<Path>, B: AsRef<Path>>(
    archive_path: P,
    output_root: B,
) -> Result<ExtractionReport> {
    let archive_path = archive_path.as_ref();
    let output_root = output_root.as_ref();

    fs::create_dir_all(output_root).map_err(|e| Error::DirectoryCreationFailed {
        path: output_root.to_path_buf(),
        source: e,
    })?;

    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);

    let mut report = ExtractionReport::default();

    for entry in archive.entries().map_err(|_| Error::Corrupted)? {
        let mut entry = entry.map_err(|_| Error::Corrupted)?;

        let raw_path = match entry.path() {
            Ok(p) => p.into_owned(),
            Err(_) => {
                warn!(archive = %archive_path.display(), "skipping entry with unreadable path");
                report.skipped_unsafe += 1;
                continue;
            }
        };

        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            let sanitized = match sanitize_entry_path(&raw_path, output_root) {
                Ok(s) => s,
                Err(e) => {
                    warn!(entry = %raw_path.display(), %e, "skipping unsafe directory entry");
                    report.skipped_unsafe += 1;
                    continue;
                }
            };
            fs::create_dir_all(&sanitized.resolved).map_err(|e| Error::DirectoryCreationFailed {
                path: sanitized.resolved.clone(),
                source: e,
            })?;
            continue;
        }

        if !entry_type.is_file() {
            report.skipped_special += 1;
            continue;
        }

        let sanitized = match sanitize_entry_path(&raw_path, output_root) {
            Ok(s) => s,
            Err(e) => {
                warn!(entry = %raw_path.display(), %e, "skipping unsafe entry");
                report.skipped_unsafe += 1;
                continue;
            }
        };

        let size = entry.header().size().unwrap_or(0);
        if let Ok(meta) = fs::metadata(&sanitized.resolved)
            && meta.is_file()
            && meta.len() == size
        {
            report.files_existing += 1;
            continue;
        }

        if let Some(parent) = sanitized.resolved.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut out = File::create(&sanitized.resolved).map_err(|e| Error::ExtractionFailed {
            path: sanitized.resolved.clone(),
            source: e,
        })?;
        io::copy(&mut entry, &mut out).map_err(|e| Error::ExtractionFailed {
            path: sanitized.resolved.clone(),
            source: e,
        })?;

        copy_permissions(&sanitized.resolved, entry.header().mode().ok());
        report.files_written += 1;
    }

    mark_complete(output_root)?;
    Ok(report)
}

/// Permission-copy failure is non-fatal; the bytes are already on disk.
fn copy_permissions(_path: &Path, _mode: Option<u32>) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = _mode {
            let _ = fs::set_permissions(_path, fs::Permissions::from_mode(mode));
        }
    }
}
