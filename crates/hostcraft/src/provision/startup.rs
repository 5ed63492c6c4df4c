//! Chooses the process the service unit starts.

use std::path::{Path, PathBuf};

use hostcraft_config::{ConfigError, HostcraftConfig};
use hostcraft_resolver::{Flavor, ResolvedBuild};
use hostcraft_systemd::{ServiceUnit, StartupCommand, UnitPair};

use super::Target;
use crate::{HostcraftError, java::JavaRuntime};

pub const JAVA_ENV: &str = "HOSTCRAFT_JAVA";

const FORGE_LIBRARIES: &str = "libraries/net/minecraftforge/forge";

fn nogui_args(flavor: Flavor) -> &'static [&'static str] {
    match flavor {
        Flavor::Paper | Flavor::Purpur | Flavor::Pufferfish | Flavor::Folia => &["--nogui"],
        Flavor::Fabric | Flavor::Forge => &["nogui"],
        Flavor::Velocity | Flavor::Geyser | Flavor::Hytale => &[],
    }
}

/// `unix_args.txt` written by Forge 1.17+ installers for exactly this
/// version and build, relative to the install directory.
pub fn forge_args_file(install_dir: &Path, version: &str, build: &str) -> Option<PathBuf> {
    let rel = Path::new(FORGE_LIBRARIES)
        .join(format!("{}-{}", version, build))
        .join("unix_args.txt");
    install_dir.join(&rel).is_file().then_some(rel)
}

/// Launchable jar produced by pre-1.17 Forge installers.
pub fn forge_legacy_jar(install_dir: &Path, version: &str, build: &str) -> Option<PathBuf> {
    [
        format!("forge-{}-{}.jar", version, build),
        format!("forge-{}-{}-universal.jar", version, build),
    ]
    .into_iter()
    .map(|name| install_dir.join(name))
    .find(|path| path.is_file())
}

pub fn startup_command(
    config: &HostcraftConfig,
    target: &Target,
    resolved: &ResolvedBuild,
    java: &JavaRuntime,
    config_path: Option<&Path>,
    launcher: &Path,
) -> Result<StartupCommand, HostcraftError> {
    let memory = &config.server.memory;
    let mut args: Vec<String> = nogui_args(target.flavor)
        .iter()
        .map(|a| a.to_string())
        .collect();
    args.extend(config.server.extra_args.iter().cloned());

    match target.flavor {
        Flavor::Hytale => {
            let config_path = config_path.ok_or(ConfigError::Missing(
                "configuration file (--config) for the hytale launcher",
            ))?;
            Ok(StartupCommand::Program {
                program: launcher.to_path_buf(),
                args: vec![
                    "launch".to_string(),
                    "--config".to_string(),
                    config_path.display().to_string(),
                    "--instance-id".to_string(),
                    target.instance_id.clone(),
                ],
            })
        }
        Flavor::Forge => {
            if let Some(args_file) =
                forge_args_file(&target.install_dir, &resolved.version, &resolved.build)
            {
                return Ok(StartupCommand::ArgsFile {
                    java: java.path.clone(),
                    min_heap: memory.min().to_string(),
                    max_heap: memory.max().to_string(),
                    jvm_args: Vec::new(),
                    args_file,
                    args,
                });
            }
            let jar = forge_legacy_jar(&target.install_dir, &resolved.version, &resolved.build)
                .ok_or_else(|| HostcraftError::MissingArtifact {
                    dir: target.install_dir.clone(),
                    reason: format!(
                        "the Forge installer left neither unix_args.txt nor forge-{}-{}.jar",
                        resolved.version, resolved.build
                    ),
                })?;
            Ok(StartupCommand::Jar {
                java: java.path.clone(),
                min_heap: memory.min().to_string(),
                max_heap: memory.max().to_string(),
                jvm_args: Vec::new(),
                jar,
                args,
            })
        }
        _ => Ok(StartupCommand::Jar {
            java: java.path.clone(),
            min_heap: memory.min().to_string(),
            max_heap: memory.max().to_string(),
            jvm_args: Vec::new(),
            jar: resolved.download.destination.clone(),
            args,
        }),
    }
}

pub fn unit_pair(
    config: &HostcraftConfig,
    target: &Target,
    resolved: &ResolvedBuild,
    java: &JavaRuntime,
    config_path: Option<&Path>,
) -> Result<UnitPair, HostcraftError> {
    let launcher = std::env::current_exe().map_err(HostcraftError::io("/proc/self/exe"))?;
    let command = startup_command(config, target, resolved, java, config_path, &launcher)?;

    let description = format!(
        "{} server {} ({} {})",
        target.flavor.product(),
        target.instance_id,
        target.flavor,
        resolved.version
    );
    let mut service = ServiceUnit::new(
        description,
        target.names.clone(),
        &target.install_dir,
        command,
        &config.systemd,
    );
    if target.flavor == Flavor::Hytale {
        service = service.with_env(JAVA_ENV, java.path.display().to_string());
    }

    Ok(UnitPair::new(service))
}
