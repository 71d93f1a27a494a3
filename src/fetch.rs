//! Remote file retrieval
//!
//! Downloads are streamed to `<dest>.part` and renamed into place once the
//! body is complete, so an interrupted download never looks finished.

use eyre::{Context, Result, eyre};
use reqwest::Client;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Write buffer size for downloads
pub const BUFFER_CAPACITY: usize = 8 * 1024;

/// HTTP downloader for source files
///
/// # Example
/// ```no_run
/// use parquet_etl::fetch::Fetcher;
/// use url::Url;
/// use std::path::Path;
///
/// # async fn example() -> eyre::Result<()> {
/// let fetcher = Fetcher::try_new()?;
/// let url = Url::parse("https://example.com/order.json.gz")?;
/// if fetcher.fetch(&url, Path::new("data/raw/orders.json.gz")).await {
///     println!("ready");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
    refresh: bool,
}

impl Fetcher {
    /// Create a fetcher with a default HTTP client
    pub fn try_new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .with_context(|| "Failed to build HTTP client")?;
        Ok(Self {
            client,
            refresh: false,
        })
    }

    /// Download again even when the destination exists (default: false)
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Make sure `dest` holds the resource at `url`
    ///
    /// An existing destination counts as success without touching the
    /// network. Failures are logged and reported as `false`.
    pub async fn fetch(&self, url: &Url, dest: &Path) -> bool {
        if !self.refresh && dest.exists() {
            log::info!("File already exists: {}", dest.display());
            return true;
        }

        log::info!("Downloading {} to {}", url, dest.display());
        let partial = partial_path(dest);

        match self.download(url, dest, &partial).await {
            Ok(bytes) => {
                log::info!("Download completed: {} ({} bytes)", dest.display(), bytes);
                true
            }
            Err(e) => {
                log::error!("Failed to download {}: {:#}", url, e);
                if partial.exists()
                    && let Err(e) = std::fs::remove_file(&partial)
                {
                    log::warn!("Failed to remove {}: {}", partial.display(), e);
                }
                false
            }
        }
    }

    async fn download(&self, url: &Url, dest: &Path, partial: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("Server responded with {}", status));
        }

        let file = File::create(partial)
            .with_context(|| format!("Failed to create file: {}", partial.display()))?;
        let mut writer = BufWriter::with_capacity(BUFFER_CAPACITY, file);

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?
        {
            writer.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        writer.flush()?;
        drop(writer);

        std::fs::rename(partial, dest)
            .with_context(|| format!("Failed to move download into {}", dest.display()))?;

        Ok(written)
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
