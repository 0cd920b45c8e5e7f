use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_BASE_URL;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "stationsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Download and extract yearly station observation archives",
    long_about = None
)]
pub struct App {
    /// First year to synchronize
    #[arg(long, default_value_t = 1901)]
    pub start: u16,

    /// Last year to synchronize
    #[arg(long, default_value_t = 2025)]
    pub end: u16,

    /// Parallel download workers
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Keep source archives after successful extraction
    #[arg(long)]
    pub keep_archives: bool,

    /// Remote listing/object base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Data root; raw/, extracted/ and reports/ live beneath it
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,
}
