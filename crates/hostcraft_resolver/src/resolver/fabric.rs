use hostcraft_net::HttpTransport;
use serde::Deserialize;

use super::{Resolution, Resolver, is_latest};
use crate::{ResolveError, latest_stable};

#[derive(Debug, Deserialize)]
struct MetaVersion {
    version: String,
    #[serde(default)]
    stable: bool,
}

fn latest_marked_stable(entries: &[MetaVersion]) -> Option<String> {
    latest_stable(
        entries
            .iter()
            .filter(|entry| entry.stable)
            .map(|entry| entry.version.as_str()),
    )
}

/// Fabric: the "build" is the loader version; the installer is always the
/// newest stable one.
pub(super) async fn resolve<T: HttpTransport>(
    resolver: &Resolver<T>,
    version: &str,
    build: &str,
) -> Result<Resolution, ResolveError> {
    let base = format!(
        "{}/v2/versions",
        resolver.endpoints().fabric_meta.trim_end_matches('/')
    );

    let version = if is_latest(version) {
        let url = format!("{}/game", base);
        let games: Vec<MetaVersion> = resolver.fetch_json(&url).await?;
        latest_marked_stable(&games)
            .ok_or_else(|| ResolveError::resolution("no stable Minecraft version known to Fabric"))?
    } else {
        version.to_string()
    };

    let loader = if is_latest(build) {
        let url = format!("{}/loader", base);
        let loaders: Vec<MetaVersion> = resolver.fetch_json(&url).await?;
        latest_marked_stable(&loaders)
            .ok_or_else(|| ResolveError::resolution("no stable Fabric loader published"))?
    } else {
        build.to_string()
    };

    let url = format!("{}/installer", base);
    let installers: Vec<MetaVersion> = resolver.fetch_json(&url).await?;
    let installer = latest_marked_stable(&installers)
        .ok_or_else(|| ResolveError::resolution("no stable Fabric installer published"))?;

    Ok(Resolution {
        url: format!(
            "{}/loader/{}/{}/{}/server/jar",
            base, version, loader, installer
        ),
        version,
        build: loader,
    })
}
