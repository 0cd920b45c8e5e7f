use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::client::HttpClient;
use crate::error::{FetchError, Result};
use crate::retry::retry_delay;

/// Path of the in-progress twin of a destination file.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Downloads one remote object to a local path with partial resume.
///
/// The destination file only ever appears through an atomic rename of the
/// `.part` file once all bytes are confirmed written; no reader can observe a
/// partially written final file.
pub struct ResumableFetcher<C: HttpClient> {
    client: C,
    max_attempts: u32,
    backoff_base: Duration,
}

impl<C: HttpClient> ResumableFetcher<C> {
    pub fn new(client: C, max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            client,
            max_attempts,
            backoff_base,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run [`fetch`](Self::fetch) under bounded exponential-backoff retry.
    ///
    /// Only transient failures are retried; a permanent failure propagates
    /// immediately. Exhausting the attempt budget maps to
    /// [`FetchError::MaxRetriesExceeded`].
    pub async fn fetch_with_retry(&self, url: &str, destination: &Path) -> Result<u64> {
        let mut attempt = 0u32;
        loop {
            match self.fetch(url, destination).await {
                Ok(written) => return Ok(written),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        warn!(url, %e, attempts = attempt, "giving up on transfer");
                        return Err(FetchError::MaxRetriesExceeded { attempts: attempt });
                    }
                    let delay = retry_delay(attempt - 1, self.backoff_base);
                    warn!(url, %e, attempt, delay_ms = delay.as_millis() as u64, "retrying transfer");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Download `url` to `destination`, resuming an existing `.part` file
    /// when the server supports byte ranges.
    ///
    /// A server without range support cannot be trusted to return the same
    /// byte range twice, so any partial file is discarded and the transfer
    /// restarts from zero. A body that ends short of the reported total is an
    /// error, never a success.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<u64> {
        let partial = partial_path(destination);
        let offset = match fs::metadata(&partial).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        let meta = self.client.probe(url).await?;
        let resume = offset > 0 && meta.accepts_ranges;
        let mut written = if resume { offset } else { 0 };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = if resume {
            debug!(url, offset, "resuming partial download");
            fs::OpenOptions::new().append(true).open(&partial).await?
        } else {
            fs::File::create(&partial).await?
        };

        let mut stream = self.client.stream(url, resume.then_some(offset)).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        if let Some(total) = meta.content_length
            && written < total
        {
            return Err(FetchError::Incomplete {
                got: written,
                want: total,
            });
        }

        // Sole publish point.
        fs::rename(&partial, destination).await?;
        Ok(written)
    }
}
