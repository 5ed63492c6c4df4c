use std::collections::HashMap;

use hostcraft_net::HttpTransport;
use serde::Deserialize;
use serde_json::Value;

use super::{Resolution, Resolver, is_latest};
use crate::{Flavor, ResolveError, latest_stable};

#[derive(Debug, Deserialize)]
struct TypeResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    /// Keyed by version; values are the newest build of that version.
    #[serde(default)]
    builds: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    #[serde(default)]
    builds: Vec<McjarsBuild>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct McjarsBuild {
    build_number: Option<i64>,
    jar_url: Option<String>,
}

fn api_type(flavor: Flavor) -> String {
    flavor.as_str().to_ascii_uppercase()
}

fn check_success(url: &str, success: bool, error: Option<String>) -> Result<(), ResolveError> {
    if success {
        Ok(())
    } else {
        Err(ResolveError::metadata(
            url,
            error.unwrap_or_else(|| "request was not successful".to_string()),
        ))
    }
}

/// Purpur and Pufferfish through the MCJars unified builds API.
pub(super) async fn resolve<T: HttpTransport>(
    resolver: &Resolver<T>,
    flavor: Flavor,
    version: &str,
    build: &str,
) -> Result<Resolution, ResolveError> {
    let type_url = format!(
        "{}/api/v2/builds/{}",
        resolver.endpoints().mcjars.trim_end_matches('/'),
        api_type(flavor)
    );

    let version = if is_latest(version) {
        let response: TypeResponse = resolver.fetch_json(&type_url).await?;
        check_success(&type_url, response.success, response.error)?;
        latest_stable(response.builds.keys()).ok_or_else(|| {
            ResolveError::resolution(format!("no stable {} version published", flavor))
        })?
    } else {
        version.to_string()
    };

    let version_url = format!("{}/{}", type_url, version);
    let response: VersionResponse = resolver.fetch_json(&version_url).await?;
    check_success(&version_url, response.success, response.error)?;

    let selected = if is_latest(build) {
        // Newest first upstream, but do not rely on it when numbers are present.
        let numbered = response
            .builds
            .iter()
            .filter(|b| b.build_number.is_some())
            .max_by_key(|b| b.build_number);
        numbered.or_else(|| response.builds.first())
    } else {
        response
            .builds
            .iter()
            .find(|b| b.build_number.map(|n| n.to_string()).as_deref() == Some(build))
    };

    let selected = selected.ok_or_else(|| {
        ResolveError::resolution(format!("{} {} has no build {}", flavor, version, build))
    })?;

    let url = selected
        .jar_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            ResolveError::resolution(format!(
                "{} {} build {} has no jarUrl",
                flavor, version, build
            ))
        })?
        .to_string();

    let build = selected
        .build_number
        .map(|n| n.to_string())
        .unwrap_or_else(|| build.to_string());

    Ok(Resolution {
        version,
        build,
        url,
    })
}
