use std::path::PathBuf;

use hostcraft_config::HostcraftConfig;

use crate::{Flavor, ResolveError};

/// What the operator asked for. `version` and `build` may be `"latest"`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub flavor: Flavor,
    pub version: String,
    pub build: String,
    /// Skips metadata lookups entirely when set.
    pub download_url: Option<String>,
    pub sha256: Option<String>,
    /// Directory the artifact lands in.
    pub target_dir: PathBuf,
}

impl BuildRequest {
    pub fn new(flavor: Flavor, version: &str, build: &str, target_dir: PathBuf) -> Self {
        Self {
            flavor,
            version: version.to_string(),
            build: build.to_string(),
            download_url: None,
            sha256: None,
            target_dir,
        }
    }

    pub fn from_config(
        config: &HostcraftConfig,
        target_dir: PathBuf,
    ) -> Result<Self, ResolveError> {
        let flavor = config
            .server
            .flavor
            .as_deref()
            .ok_or_else(|| ResolveError::resolution("no flavor configured"))?
            .parse::<Flavor>()?;

        Ok(Self {
            flavor,
            version: config.server.version().to_string(),
            build: config.server.build().to_string(),
            download_url: config.server.download_url.clone(),
            sha256: config.server.sha256.clone(),
            target_dir,
        })
    }

    pub fn with_download_url(mut self, url: &str) -> Self {
        self.download_url = Some(url.to_string());
        self
    }

    pub fn with_sha256(mut self, sha256: &str) -> Self {
        self.sha256 = Some(sha256.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadDescriptor {
    pub url: String,
    /// Operator supplied SHA-256, hex encoded. Never filled by the resolver itself.
    pub sha256: Option<String>,
    pub destination: PathBuf,
}

/// Outcome of a resolution: the concrete identifiers and where to fetch them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBuild {
    pub flavor: Flavor,
    pub version: String,
    pub build: String,
    pub download: DownloadDescriptor,
}
