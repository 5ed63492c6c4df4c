use hostcraft_config::LogType;
use hostcraft_net::HttpTransport;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Resolution, Resolver, is_latest};
use crate::{Flavor, ResolveError, latest_stable};

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    builds: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct BuildResponse {
    downloads: Option<Downloads>,
}

#[derive(Debug, Deserialize)]
struct Downloads {
    application: Option<Application>,
}

#[derive(Debug, Deserialize)]
struct Application {
    name: Option<String>,
}

/// Paper, Velocity and Folia share the PaperMC v2 project API.
pub(super) async fn resolve<T: HttpTransport>(
    resolver: &Resolver<T>,
    flavor: Flavor,
    version: &str,
    build: &str,
) -> Result<Resolution, ResolveError> {
    let project_url = format!(
        "{}/v2/projects/{}",
        resolver.endpoints().papermc.trim_end_matches('/'),
        flavor.as_str()
    );

    let version = if is_latest(version) {
        let project: ProjectResponse = resolver.fetch_json(&project_url).await?;
        latest_stable(&project.versions).ok_or_else(|| {
            ResolveError::resolution(format!("no stable {} version published", flavor))
        })?
    } else {
        version.to_string()
    };

    let version_url = format!("{}/versions/{}", project_url, version);
    let build = if is_latest(build) {
        let response: VersionResponse = resolver.fetch_json(&version_url).await?;
        response
            .builds
            .iter()
            .max()
            .map(u32::to_string)
            .ok_or_else(|| {
                ResolveError::resolution(format!("no builds published for {} {}", flavor, version))
            })?
    } else {
        build.to_string()
    };

    let build_url = format!("{}/builds/{}", version_url, build);
    let metadata: BuildResponse = resolver.fetch_json(&build_url).await?;

    let name = metadata
        .downloads
        .and_then(|d| d.application)
        .and_then(|a| a.name)
        .filter(|name| !name.trim().is_empty());

    let name = match name {
        Some(name) => name,
        None => {
            let fallback = format!("{}-{}-{}.jar", flavor, version, build);
            warn!(
                log_type = LogType::Resolver.as_str(),
                "{} build {} has no download name, assuming {}", flavor, build, fallback
            );
            fallback
        }
    };
    debug!(
        log_type = LogType::Resolver.as_str(),
        "{} {} build {} is {}",
        flavor,
        version,
        build,
        name
    );

    Ok(Resolution {
        url: format!("{}/downloads/{}", build_url, name),
        version,
        build,
    })
}
