//! Archive synchronization engine for yearly station observation data.
//!
//! Resolves archive names from a remote directory listing, transfers them
//! resumably, verifies them, and extracts them into a per-year local layout,
//! running many independent year jobs under a bounded worker pool.

pub mod cli;
pub mod config;
pub mod index;
pub mod job;
pub mod orchestrator;
