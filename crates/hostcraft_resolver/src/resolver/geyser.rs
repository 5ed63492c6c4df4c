use hostcraft_net::HttpTransport;
use serde::Deserialize;

use super::{LATEST, Resolution, Resolver, is_latest};
use crate::{ResolveError, latest_stable};

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BuildResponse {
    build: Option<u64>,
    downloads: Option<Downloads>,
}

#[derive(Debug, Deserialize)]
struct Downloads {
    standalone: Option<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    name: Option<String>,
}

/// Geyser standalone through the GeyserMC download API.
pub(super) async fn resolve<T: HttpTransport>(
    resolver: &Resolver<T>,
    version: &str,
    build: &str,
) -> Result<Resolution, ResolveError> {
    let project_url = format!(
        "{}/v2/projects/geyser",
        resolver.endpoints().geysermc.trim_end_matches('/')
    );

    let version = if is_latest(version) {
        let project: ProjectResponse = resolver.fetch_json(&project_url).await?;
        latest_stable(&project.versions)
            .ok_or_else(|| ResolveError::resolution("no stable Geyser version published"))?
    } else {
        version.to_string()
    };

    let requested = if is_latest(build) { LATEST } else { build };
    let build_url = format!("{}/versions/{}/builds/{}", project_url, version, requested);
    let metadata: BuildResponse = resolver.fetch_json(&build_url).await?;

    let build = match metadata.build {
        Some(number) => number.to_string(),
        None if !is_latest(build) => build.to_string(),
        None => {
            return Err(ResolveError::resolution(format!(
                "Geyser {} latest build has no build number",
                version
            )));
        }
    };

    let has_standalone = metadata
        .downloads
        .and_then(|d| d.standalone)
        .and_then(|a| a.name)
        .is_some_and(|name| !name.trim().is_empty());
    if !has_standalone {
        return Err(ResolveError::resolution(format!(
            "Geyser {} build {} has no standalone download",
            version, build
        )));
    }

    Ok(Resolution {
        url: format!(
            "{}/versions/{}/builds/{}/downloads/standalone",
            project_url, version, build
        ),
        version,
        build,
    })
}
