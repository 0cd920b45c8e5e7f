//! Streaming `.tar.gz` extraction with path sanitization and idempotent re-runs.
//!
//! The member stream is consumed lazily, entry paths are sanitized against the
//! output root before any write, already-materialized files are detected by
//! name and size, and a completion marker records a fully successful pass so
//! later runs can skip the archive without opening it.

mod error;
mod extract;
mod sanitize;
mod verify;

pub use error::{Error, Result};
pub use extract::{COMPLETION_MARKER, ExtractionReport, extract, is_complete};
pub use sanitize::{SanitizedPath, sanitize_entry_path};
pub use verify::verify;
