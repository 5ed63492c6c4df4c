use std::{
    io,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use hostcraft_config::LogType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::AuthError;

const CACHE_MODE: u32 = 0o600;

/// On-disk form of the token cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheRecord {
    pub refresh_token: String,
    pub profile_uuid: String,
    pub timestamp: u64,
}

/// Loose view used for validation: `null` and absent keys both land in `None`.
#[derive(Deserialize)]
struct RawRecord {
    refresh_token: Option<String>,
    profile_uuid: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    Missing,
    Valid(CacheRecord),
    /// The file existed but could not be trusted; it has been deleted.
    Invalid(String),
}

/// Refresh token and selected profile of one installation.
///
/// There is a single writer per install directory and no locking: two
/// processes authenticating the same installation at once may overwrite each
/// other's refresh token.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<CacheState, AuthError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheState::Missing),
            Err(e) => return Err(e.into()),
        };

        match self.parse(&content) {
            Ok(record) => {
                debug!(
                    log_type = LogType::Authentication.as_str(),
                    "Using cached credentials from {}",
                    self.path.display()
                );
                Ok(CacheState::Valid(record))
            }
            Err(AuthError::InvalidOrIncompleteCache { reason, .. }) => {
                warn!(
                    log_type = LogType::Authentication.as_str(),
                    "Discarding token cache {}: {}",
                    self.path.display(),
                    reason
                );
                self.clear().await?;
                Ok(CacheState::Invalid(reason))
            }
            Err(e) => Err(e),
        }
    }

    fn parse(&self, content: &str) -> Result<CacheRecord, AuthError> {
        let invalid = |reason: String| AuthError::InvalidOrIncompleteCache {
            path: self.path.clone(),
            reason,
        };

        let raw: RawRecord =
            serde_json::from_str(content).map_err(|e| invalid(format!("not valid JSON: {}", e)))?;

        let refresh_token = raw
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("refresh_token is missing".to_string()))?;
        let profile_uuid = raw
            .profile_uuid
            .filter(|p| !p.is_empty())
            .ok_or_else(|| invalid("profile_uuid is missing".to_string()))?;

        Ok(CacheRecord {
            refresh_token,
            profile_uuid,
            timestamp: raw.timestamp.and_then(|t| t.as_u64()).unwrap_or(0),
        })
    }

    /// Writes the record through a temporary file readable by the owner only.
    pub async fn store(
        &self,
        refresh_token: &str,
        profile_uuid: &str,
    ) -> Result<CacheRecord, AuthError> {
        let record = CacheRecord {
            refresh_token: refresh_token.to_string(),
            profile_uuid: profile_uuid.to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };

        let content = serde_json::to_string_pretty(&record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let _ = fs::remove_file(&temp_path).await;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(CACHE_MODE);

        let mut file = options.open(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        debug!(
            log_type = LogType::Authentication.as_str(),
            "Stored token cache {}",
            self.path.display()
        );
        Ok(record)
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir) -> TokenCache {
        TokenCache::new(dir.path().join(".hytale-auth.json"))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        let stored = cache.store("rt-123", "0f3a-profile").await.unwrap();
        let loaded = cache.load().await.unwrap();

        match loaded {
            CacheState::Valid(record) => {
                assert_eq!(record.refresh_token, "rt-123");
                assert_eq!(record.profile_uuid, "0f3a-profile");
                assert_eq!(record.timestamp, stored.timestamp);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cache_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        cache.store("rt", "uuid").await.unwrap();

        let mode = std::fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(cache_in(&dir).load().await.unwrap(), CacheState::Missing);
    }

    #[tokio::test]
    async fn test_invalid_json_is_deleted() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        std::fs::write(cache.path(), "{ not json").unwrap();

        assert!(matches!(cache.load().await.unwrap(), CacheState::Invalid(_)));
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn test_missing_or_null_key_is_deleted() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        for content in [
            r#"{"refresh_token":"rt","timestamp":1}"#,
            r#"{"profile_uuid":"p","timestamp":1}"#,
            r#"{"refresh_token":null,"profile_uuid":"p"}"#,
            r#"{"refresh_token":"rt","profile_uuid":null}"#,
            r#"[]"#,
        ] {
            std::fs::write(cache.path(), content).unwrap();
            assert!(
                matches!(cache.load().await.unwrap(), CacheState::Invalid(_)),
                "accepted {content}"
            );
            assert!(!cache.path().exists());
        }
    }

    #[tokio::test]
    async fn test_timestamp_is_optional() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        std::fs::write(cache.path(), r#"{"refresh_token":"rt","profile_uuid":"p"}"#).unwrap();

        match cache.load().await.unwrap() {
            CacheState::Valid(record) => assert_eq!(record.timestamp, 0),
            other => panic!("unexpected state: {other:?}"),
        }
    }
}
