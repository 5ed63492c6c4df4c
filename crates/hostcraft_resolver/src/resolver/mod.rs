mod fabric;
mod forge;
mod geyser;
mod mcjars;
mod papermc;

use hostcraft_config::{ApiEndpoints, LogType};
use hostcraft_net::HttpTransport;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::{
    BuildRequest, DownloadDescriptor, Flavor, ResolveError, ResolvedBuild, validate_url,
};

pub(crate) const LATEST: &str = "latest";

pub(crate) fn is_latest(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(LATEST)
}

/// Concrete (version, build, url) picked by a flavor-specific strategy.
#[derive(Debug)]
pub(crate) struct Resolution {
    pub version: String,
    pub build: String,
    pub url: String,
}

/// Resolves build requests against the upstream metadata services.
pub struct Resolver<T: HttpTransport> {
    transport: T,
    endpoints: ApiEndpoints,
}

impl<T: HttpTransport> Resolver<T> {
    pub fn new(transport: T, endpoints: ApiEndpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    #[instrument(skip(self, request), fields(flavor = %request.flavor, version = %request.version, build = %request.build))]
    pub async fn resolve(&self, request: &BuildRequest) -> Result<ResolvedBuild, ResolveError> {
        let resolution = match &request.download_url {
            Some(url) => Resolution {
                version: request.version.clone(),
                build: request.build.clone(),
                url: url.trim().to_string(),
            },
            None => self.resolve_upstream(request).await?,
        };

        validate_url(&resolution.url)?;

        let destination = request
            .target_dir
            .join(artifact_file_name(request.flavor, &resolution.url));

        info!(
            log_type = LogType::Resolver.as_str(),
            "Resolved {} {} build {} to {}",
            request.flavor,
            resolution.version,
            resolution.build,
            resolution.url
        );

        Ok(ResolvedBuild {
            flavor: request.flavor,
            version: resolution.version,
            build: resolution.build,
            download: DownloadDescriptor {
                url: resolution.url,
                sha256: request.sha256.clone(),
                destination,
            },
        })
    }

    async fn resolve_upstream(&self, request: &BuildRequest) -> Result<Resolution, ResolveError> {
        let version = request.version.trim();
        let build = request.build.trim();
        if version.is_empty() || build.is_empty() {
            return Err(ResolveError::resolution(
                "version and build must not be empty (use \"latest\")",
            ));
        }

        match request.flavor {
            Flavor::Paper | Flavor::Velocity | Flavor::Folia => {
                papermc::resolve(self, request.flavor, version, build).await
            }
            Flavor::Purpur | Flavor::Pufferfish => {
                mcjars::resolve(self, request.flavor, version, build).await
            }
            Flavor::Fabric => fabric::resolve(self, version, build).await,
            Flavor::Forge => forge::resolve(self, version, build).await,
            Flavor::Geyser => geyser::resolve(self, version, build).await,
            Flavor::Hytale => Err(ResolveError::resolution(
                "hytale has no public build API; set server.download_url",
            )),
        }
    }

    /// GET `url` and decode it, treating transport errors, non-2xx answers
    /// and undecodable bodies alike as metadata failures.
    pub(crate) async fn fetch_json<D: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<D, ResolveError> {
        debug!(log_type = LogType::Resolver.as_str(), "Fetching metadata {}", url);
        let response = self
            .transport
            .get(url, None)
            .await
            .map_err(|e| ResolveError::metadata(url, e.to_string()))?;

        if !response.is_success() {
            return Err(ResolveError::metadata(
                url,
                format!("HTTP {}: {}", response.status, response.excerpt()),
            ));
        }

        response.json().map_err(|e| {
            ResolveError::metadata(
                url,
                format!("invalid JSON ({}): {}", e, response.excerpt()),
            )
        })
    }
}

/// Fixed per-flavor name, except for direct Hytale URLs where the upstream
/// file name (jar or archive) is kept.
fn artifact_file_name(flavor: Flavor, url: &str) -> String {
    if flavor == Flavor::Hytale {
        if let Some(name) = url.rsplit('/').next() {
            if !name.is_empty() && !name.contains(':') && name.contains('.') {
                return name.to_string();
            }
        }
    }
    flavor.artifact_name().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_latest() {
        assert!(is_latest("latest"));
        assert!(is_latest(" LATEST "));
        assert!(!is_latest("1.20.4"));
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name(Flavor::Paper, "https://x.test/paper-1.20.4-496.jar"),
            "server.jar"
        );
        assert_eq!(
            artifact_file_name(Flavor::Hytale, "https://cdn.test/hytale/HytaleServer-2026.01.zip"),
            "HytaleServer-2026.01.zip"
        );
        assert_eq!(
            artifact_file_name(Flavor::Hytale, "https://cdn.test/download"),
            "HytaleServer.jar"
        );
    }
}
