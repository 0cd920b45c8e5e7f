use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;

use stationsync::config::SyncConfig;
use stationsync::job::JobStatus;
use stationsync::orchestrator;
use stationsync_fetch::{BoxStream, FetchError, HttpClient, RemoteMeta, ResumableFetcher, Result};

/// In-memory remote archive server: one listing page, named tar.gz objects.
struct MockRemote {
    listing: String,
    objects: HashMap<String, Vec<u8>>,
    stream_calls: AtomicUsize,
}

impl MockRemote {
    fn new(listing: &str, objects: &[(&str, Vec<u8>)]) -> Self {
        Self {
            listing: listing.to_string(),
            objects: objects
                .iter()
                .map(|(name, body)| (name.to_string(), body.clone()))
                .collect(),
            stream_calls: AtomicUsize::new(0),
        }
    }

    fn object_for(&self, url: &str) -> Result<&Vec<u8>> {
        let name = url.rsplit('/').next().unwrap_or_default();
        self.objects.get(name).ok_or(FetchError::Status(404))
    }
}

impl HttpClient for MockRemote {
    async fn probe(&self, url: &str) -> Result<RemoteMeta> {
        let body = self.object_for(url)?;
        Ok(RemoteMeta {
            content_length: Some(body.len() as u64),
            accepts_ranges: true,
        })
    }

    async fn stream(
        &self,
        url: &str,
        resume_from: Option<u64>,
    ) -> Result<BoxStream<'static, Result<Bytes>>> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let body = self.object_for(url)?;
        let start = resume_from.unwrap_or(0) as usize;
        let chunks: Vec<Result<Bytes>> = body[start..]
            .chunks(4096)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }

    async fn get_text(&self, _url: &str) -> Result<String> {
        Ok(self.listing.clone())
    }
}

fn archive_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn test_config(data_root: &Path) -> SyncConfig {
    let mut cfg = SyncConfig::new("http://mock/csv/", data_root, false);
    cfg.pause_between_files = Duration::ZERO;
    cfg.backoff_base = Duration::ZERO;
    cfg.ensure_layout().unwrap();
    cfg
}

const LISTING: &str = r#"
    <a href="1998.tar.gz">1998.tar.gz</a>
    <a href="2000.tar.gz">2000.tar.gz</a>
"#;

fn remote_with_two_years() -> MockRemote {
    MockRemote::new(
        LISTING,
        &[
            (
                "1998.tar.gz",
                archive_bytes(&[
                    ("72530094846.csv", b"station,obs\n".as_slice()),
                    ("72404513705.csv", b"station,obs\n".as_slice()),
                ]),
            ),
            (
                "2000.tar.gz",
                archive_bytes(&[("99999904856.csv", b"station,obs\n".as_slice())]),
            ),
        ],
    )
}

#[tokio::test]
async fn end_to_end_run_over_a_sparse_listing() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = Arc::new(test_config(temp.path()));
    let fetcher = Arc::new(ResumableFetcher::new(remote_with_two_years(), 3, Duration::ZERO));

    let summary = orchestrator::run(
        Arc::clone(&cfg),
        Arc::clone(&fetcher),
        vec![1998, 1999, 2000],
        2,
    )
    .await
    .unwrap();

    let statuses: Vec<(u16, JobStatus)> = summary
        .outcomes
        .iter()
        .map(|o| (o.year, o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (1998, JobStatus::Done),
            (1999, JobStatus::NotFound),
            (2000, JobStatus::Done),
        ]
    );
    assert_eq!(summary.line(), "2 done / 0 skipped / 1 not-found / 0 corrupted / 0 failed");

    assert!(cfg.year_dir(1998).join("72530094846.csv").is_file());
    assert!(cfg.year_dir(2000).join("99999904856.csv").is_file());
    // keep_archives is off: verified-and-extracted archives are reclaimed.
    assert!(!cfg.archive_path("1998.tar.gz").exists());
    assert!(!cfg.archive_path("2000.tar.gz").exists());
}

#[tokio::test]
async fn second_run_transfers_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = Arc::new(test_config(temp.path()));
    let fetcher = Arc::new(ResumableFetcher::new(remote_with_two_years(), 3, Duration::ZERO));
    let years = vec![1998, 1999, 2000];

    orchestrator::run(Arc::clone(&cfg), Arc::clone(&fetcher), years.clone(), 2)
        .await
        .unwrap();
    let transfers_after_first = fetcher.client().stream_calls.load(Ordering::SeqCst);

    let summary = orchestrator::run(Arc::clone(&cfg), Arc::clone(&fetcher), years, 2)
        .await
        .unwrap();

    assert_eq!(summary.count(JobStatus::Skipped), 2);
    assert_eq!(summary.count(JobStatus::NotFound), 1);
    assert_eq!(summary.count(JobStatus::Done), 0);
    // Idempotent: the second run issued zero content requests.
    assert_eq!(
        fetcher.client().stream_calls.load(Ordering::SeqCst),
        transfers_after_first
    );
    // Skipped outcomes still report the pre-existing file count.
    let skipped_1998 = summary.outcomes.iter().find(|o| o.year == 1998).unwrap();
    assert_eq!(skipped_1998.files, 2);
}

#[tokio::test]
async fn corrupted_cached_archive_is_destroyed_then_refetched() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = Arc::new(test_config(temp.path()));
    let fetcher = Arc::new(ResumableFetcher::new(remote_with_two_years(), 3, Duration::ZERO));

    // A bad local file must not be trusted just because it exists.
    std::fs::write(cfg.archive_path("1998.tar.gz"), b"garbage, not gzip").unwrap();

    let summary = orchestrator::run(Arc::clone(&cfg), Arc::clone(&fetcher), vec![1998], 1)
        .await
        .unwrap();
    assert_eq!(summary.outcomes[0].status, JobStatus::Corrupted);
    assert!(!cfg.archive_path("1998.tar.gz").exists());
    assert_eq!(fetcher.client().stream_calls.load(Ordering::SeqCst), 0);

    // The next run re-attempts the download instead of reporting Skipped.
    let summary = orchestrator::run(Arc::clone(&cfg), Arc::clone(&fetcher), vec![1998], 1)
        .await
        .unwrap();
    assert_eq!(summary.outcomes[0].status, JobStatus::Done);
    assert_eq!(fetcher.client().stream_calls.load(Ordering::SeqCst), 1);
    assert!(cfg.year_dir(1998).join("72530094846.csv").is_file());
}

#[tokio::test]
async fn unreachable_listing_is_an_orchestrator_error() {
    struct DownRemote;
    impl HttpClient for DownRemote {
        async fn probe(&self, _url: &str) -> Result<RemoteMeta> {
            Err(FetchError::Timeout)
        }
        async fn stream(
            &self,
            _url: &str,
            _resume_from: Option<u64>,
        ) -> Result<BoxStream<'static, Result<Bytes>>> {
            Err(FetchError::Timeout)
        }
        async fn get_text(&self, _url: &str) -> Result<String> {
            Err(FetchError::Timeout)
        }
    }

    let temp = tempfile::tempdir().unwrap();
    let cfg = Arc::new(test_config(temp.path()));
    let fetcher = Arc::new(ResumableFetcher::new(DownRemote, 1, Duration::ZERO));

    let result = orchestrator::run(cfg, fetcher, vec![1998], 1).await;
    assert!(matches!(result, Err(FetchError::Timeout)));
}
