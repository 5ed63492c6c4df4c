use std::collections::HashMap;

use hostcraft_config::LogType;
use hostcraft_net::HttpTransport;
use serde::Deserialize;
use tracing::info;

use super::{Resolution, Resolver, is_latest};
use crate::{ResolveError, latest_stable};

#[derive(Debug, Deserialize)]
struct Promotions {
    #[serde(default)]
    promos: HashMap<String, String>,
}

const LATEST_SUFFIX: &str = "-latest";
const RECOMMENDED_SUFFIX: &str = "-recommended";

fn promoted_versions(promos: &HashMap<String, String>) -> impl Iterator<Item = &str> {
    promos.keys().filter_map(|key| {
        key.strip_suffix(LATEST_SUFFIX)
            .or_else(|| key.strip_suffix(RECOMMENDED_SUFFIX))
    })
}

/// Forge promotion lookup: `<mc>-latest` first, `<mc>-recommended` as fallback.
pub(super) async fn resolve<T: HttpTransport>(
    resolver: &Resolver<T>,
    version: &str,
    build: &str,
) -> Result<Resolution, ResolveError> {
    let endpoints = resolver.endpoints();

    let needs_promotions = is_latest(version) || is_latest(build);
    let promotions = if needs_promotions {
        let promotions: Promotions = resolver.fetch_json(&endpoints.forge_promotions).await?;
        promotions.promos
    } else {
        HashMap::new()
    };

    let version = if is_latest(version) {
        latest_stable(promoted_versions(&promotions)).ok_or_else(|| {
            ResolveError::resolution("no stable Minecraft version promoted by Forge")
        })?
    } else {
        version.to_string()
    };

    let build = if is_latest(build) {
        let latest = promotions.get(&format!("{}{}", version, LATEST_SUFFIX));
        let recommended = promotions.get(&format!("{}{}", version, RECOMMENDED_SUFFIX));
        match (latest, recommended) {
            (Some(latest), _) => latest.clone(),
            (None, Some(recommended)) => {
                info!(
                    log_type = LogType::Resolver.as_str(),
                    "No latest Forge promotion for {}, using recommended {}", version, recommended
                );
                recommended.clone()
            }
            (None, None) => {
                return Err(ResolveError::resolution(format!(
                    "Forge has no latest or recommended build for {}",
                    version
                )));
            }
        }
    } else {
        build.to_string()
    };

    let coordinate = format!("{}-{}", version, build);
    Ok(Resolution {
        url: format!(
            "{}/{}/forge-{}-installer.jar",
            endpoints.forge_maven.trim_end_matches('/'),
            coordinate,
            coordinate
        ),
        version,
        build,
    })
}
