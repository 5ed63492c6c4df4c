use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unsupported flavor {flavor:?}; supported flavors are: {supported}")]
    UnsupportedFlavor { flavor: String, supported: String },

    #[error("Failed to fetch build metadata from {url}: {reason}")]
    MetadataFetchFailure { url: String, reason: String },

    #[error("Version resolution failed: {0}")]
    VersionResolutionFailure(String),

    #[error("Invalid download URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    #[error("Download of {url} failed after {attempts} attempts: {last_error}")]
    DownloadFailure {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ResolveError {
    pub fn metadata(url: &str, reason: impl Into<String>) -> Self {
        ResolveError::MetadataFetchFailure {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        ResolveError::VersionResolutionFailure(msg.into())
    }
}
