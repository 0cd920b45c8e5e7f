//! Resumable HTTP downloading with atomic placement.
//!
//! # Key behaviors
//!
//! - **Resume**: an existing `.part` file's size is the resume offset; the
//!   server is probed for range support before any byte is requested.
//! - **Atomic placement**: the destination path only appears through a
//!   rename of the fully written partial file.
//! - **Mechanism-only**: pacing between transfers and job-level policy live
//!   in the caller; this crate only retries the single transfer.

mod client;
mod error;
mod resume;
mod retry;

pub use client::{BoxStream, HttpClient, RemoteMeta, ReqwestClient};
pub use error::{FetchError, Result};
pub use resume::{ResumableFetcher, partial_path};
pub use retry::retry_delay;
