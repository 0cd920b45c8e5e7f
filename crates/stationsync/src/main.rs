use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use stationsync::cli::App;
use stationsync::config::SyncConfig;
use stationsync::orchestrator::{self, year_range};
use stationsync_fetch::{ReqwestClient, ResumableFetcher};

/// Log to stdout and to an append-only per-run report file.
fn init_logging(cfg: &SyncConfig) -> anyhow::Result<()> {
    let log_path = cfg.report_dir.join(format!(
        "sync_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create run log {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let app = App::parse();

    let cfg = Arc::new(SyncConfig::new(
        app.base_url.clone(),
        &app.data_root,
        app.keep_archives,
    ));
    cfg.ensure_layout().context("failed to create data layout")?;
    init_logging(&cfg)?;

    let years = year_range(app.start, app.end);
    info!(
        start = years.first().copied().unwrap_or_default(),
        end = years.last().copied().unwrap_or_default(),
        workers = app.workers,
        data_root = %app.data_root.display(),
        "station archive sync started"
    );

    let client = ReqwestClient::new(cfg.connect_timeout, cfg.read_timeout)
        .context("failed to build HTTP client")?;
    let fetcher = Arc::new(ResumableFetcher::new(client, cfg.retries, cfg.backoff_base));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let summary = runtime
        .block_on(orchestrator::run(
            Arc::clone(&cfg),
            fetcher,
            years,
            app.workers,
        ))
        .context("listing endpoint unreachable")?;

    info!("summary: {}", summary.line());
    Ok(())
}
