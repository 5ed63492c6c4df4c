use std::path::Path;

use hostcraft_config::LogType;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncReadExt};
use tracing::{error, info};

use crate::ResolveError;

const READ_BUFFER: usize = 64 * 1024;

/// Hex-encoded SHA-256 of a file, streamed.
pub async fn sha256_file(path: &Path) -> Result<String, ResolveError> {
    let mut file = fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compares the file digest with `expected` (case-insensitive hex). A
/// mismatching file is deleted before the error is returned.
pub async fn verify_sha256(path: &Path, expected: &str) -> Result<(), ResolveError> {
    let expected = expected.trim();
    let actual = sha256_file(path).await?;

    if actual.eq_ignore_ascii_case(expected) {
        info!(log_type = LogType::Download.as_str(), "SHA-256 verified for {}", path.display());
        return Ok(());
    }

    error!(
        log_type = LogType::Download.as_str(),
        "SHA-256 mismatch for {}: expected {}, got {}",
        path.display(),
        expected,
        actual
    );
    fs::remove_file(path).await?;

    Err(ResolveError::ChecksumMismatch {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        actual,
    })
}
