mod checksum;

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use hostcraft_config::LogType;
use hostcraft_net::HttpTransport;
use tokio::{fs, time::sleep};
use tracing::{debug, info, instrument, warn};

pub use checksum::{sha256_file, verify_sha256};

use crate::{DownloadDescriptor, ResolveError, validate_url};

pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Fetches artifacts with bounded retries and optional SHA-256 verification.
///
/// Bytes are streamed to `<destination>.part` and renamed into place only once
/// the transfer succeeded with a non-empty body, so a failed run never leaves
/// something at `destination` that looks like a valid artifact.
pub struct Downloader<T: HttpTransport> {
    transport: T,
}

impl<T: HttpTransport> Downloader<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[instrument(skip(self, descriptor), fields(url = %descriptor.url))]
    pub async fn fetch(&self, descriptor: &DownloadDescriptor) -> Result<PathBuf, ResolveError> {
        validate_url(&descriptor.url)?;

        let destination = &descriptor.destination;
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let part = part_path(destination);
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(
                log_type = LogType::Download.as_str(),
                attempt,
                "Downloading {}",
                descriptor.url
            );

            match self.transport.download(&descriptor.url, &part).await {
                Ok(_) if file_len(&part).await > 0 => {
                    fs::rename(&part, destination).await?;
                    info!(
                        log_type = LogType::Download.as_str(),
                        "Downloaded {} to {}",
                        descriptor.url,
                        destination.display()
                    );
                    if let Some(expected) = &descriptor.sha256 {
                        verify_sha256(destination, expected).await?;
                    }
                    return Ok(destination.clone());
                }
                Ok(_) => last_error = "downloaded file is empty".to_string(),
                Err(e) => last_error = e.to_string(),
            }

            remove_if_exists(&part).await?;
            warn!(
                log_type = LogType::Download.as_str(),
                "Attempt {}/{} for {} failed: {}", attempt, MAX_ATTEMPTS, descriptor.url, last_error
            );

            if attempt < MAX_ATTEMPTS {
                sleep(RETRY_DELAY).await;
            }
        }

        Err(ResolveError::DownloadFailure {
            url: descriptor.url.clone(),
            attempts: MAX_ATTEMPTS,
            last_error,
        })
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    destination.with_file_name(name)
}

async fn file_len(path: &Path) -> u64 {
    fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

async fn remove_if_exists(path: &Path) -> Result<(), ResolveError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
