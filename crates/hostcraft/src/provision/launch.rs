//! `ExecStart` of Hytale units: obtain a fresh game session, then replace
//! the current process with the server.

use std::path::{Path, PathBuf};

use hostcraft_auth::{CancellationToken, GameSession, HytaleAuthenticator};
use hostcraft_config::{ConfigError, HostcraftConfig, LogType};
use hostcraft_net::HttpTransport;
use hostcraft_resolver::Flavor;
use tracing::info;

use super::Target;
use crate::{HostcraftError, server_files::DEFAULT_HYTALE_PORT};

pub const SESSION_TOKEN_ENV: &str = "HYTALE_SERVER_SESSION_TOKEN";
pub const IDENTITY_TOKEN_ENV: &str = "HYTALE_SERVER_IDENTITY_TOKEN";

const SERVER_JAR: &str = "HytaleServer.jar";
const DEFAULT_ASSETS: &str = "Assets.zip";

/// Fully resolved server invocation. Holds secrets, so it is never logged.
#[derive(Clone)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: PathBuf,
}

/// Server jar, either at the top of the install directory or inside the
/// `Server/` folder of the distribution archive.
pub fn hytale_jar(install_dir: &Path) -> Result<PathBuf, HostcraftError> {
    [
        install_dir.join(SERVER_JAR),
        install_dir.join("Server").join(SERVER_JAR),
    ]
    .into_iter()
    .find(|p| p.is_file())
    .ok_or_else(|| HostcraftError::MissingArtifact {
        dir: install_dir.to_path_buf(),
        reason: format!("{} not found", SERVER_JAR),
    })
}

fn assets_path(config: &HostcraftConfig, install_dir: &Path) -> Option<PathBuf> {
    match &config.hytale.assets {
        Some(assets) => Some(install_dir.join(assets)),
        None => Some(install_dir.join(DEFAULT_ASSETS)).filter(|p| p.exists()),
    }
}

pub fn launch_plan(
    config: &HostcraftConfig,
    target: &Target,
    java: &Path,
    session: &GameSession,
) -> Result<LaunchPlan, HostcraftError> {
    let jar = hytale_jar(&target.install_dir)?;
    let memory = &config.server.memory;
    let port = config.server.port.unwrap_or(DEFAULT_HYTALE_PORT);

    let mut args = vec![
        format!("-Xms{}", memory.min()),
        format!("-Xmx{}", memory.max()),
        "-jar".to_string(),
        jar.display().to_string(),
    ];
    if let Some(assets) = assets_path(config, &target.install_dir) {
        args.push("--assets".to_string());
        args.push(assets.display().to_string());
    }
    args.extend([
        "--bind".to_string(),
        format!("0.0.0.0:{}", port),
        "--session-token".to_string(),
        session.session_token.clone(),
        "--identity-token".to_string(),
        session.identity_token.clone(),
    ]);
    args.extend(config.server.extra_args.iter().cloned());

    Ok(LaunchPlan {
        program: java.to_path_buf(),
        args,
        env: vec![
            (SESSION_TOKEN_ENV.to_string(), session.session_token.clone()),
            (IDENTITY_TOKEN_ENV.to_string(), session.identity_token.clone()),
        ],
        working_dir: target.install_dir.clone(),
    })
}

/// Authenticates and builds the server invocation.
pub async fn prepare<T: HttpTransport>(
    config: &HostcraftConfig,
    transport: T,
    java: Option<PathBuf>,
    cancel: &CancellationToken,
) -> Result<LaunchPlan, HostcraftError> {
    let target = Target::from_config(config)?;
    if target.flavor != Flavor::Hytale {
        return Err(ConfigError::invalid(
            "server.flavor",
            target.flavor.as_str(),
            "launch only applies to hytale installations",
        )
        .into());
    }
    config.server.memory.validate()?;

    let authenticator = HytaleAuthenticator::new(
        transport,
        config.hytale.auth.clone(),
        target.auth_cache_path(config),
    );
    let session = authenticator.session(cancel).await?;

    let java = java
        .or_else(|| config.java.path.clone())
        .unwrap_or_else(|| PathBuf::from("java"));
    let plan = launch_plan(config, &target, &java, &session)?;

    info!(
        log_type = LogType::Authentication.as_str(),
        "Session ready for profile {}, starting {}",
        session.profile_uuid,
        plan.program.display()
    );
    Ok(plan)
}

/// Replaces the current process with the server. Only returns on failure.
#[cfg(unix)]
pub fn exec(plan: &LaunchPlan) -> HostcraftError {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(&plan.program)
        .args(&plan.args)
        .envs(plan.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&plan.working_dir)
        .exec();
    HostcraftError::io(&plan.program)(err)
}
