//! Fetching release artifacts to local files

use super::ProvisionError;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Fetches a URL into a local file
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), ProvisionError>;
}

/// Blocking HTTP downloader
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, ProvisionError> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, ProvisionError> {
        // `None` lifts the blocking client's default 30s limit.
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("spin-actions/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisionError::download("", format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), ProvisionError> {
        debug!(%url, dest = %dest.display(), "Fetching artifact");

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProvisionError::download(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProvisionError::download(
                url,
                format!("unexpected HTTP status {}", response.status()),
            ));
        }

        let mut file = File::create(dest).map_err(|e| ProvisionError::filesystem(dest, e))?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| ProvisionError::download(url, e.to_string()))?;

        debug!(%url, bytes, "Artifact downloaded");
        Ok(())
    }
}

/// File name to store a download under, taken from the last URL path segment
pub fn download_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("download")
        .to_string()
}
