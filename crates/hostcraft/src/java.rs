//! Java runtime selection and installation.

use std::path::{Path, PathBuf};

use hostcraft_config::{JavaConfig, LogType};
use hostcraft_resolver::Flavor;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::{HostcraftError, SystemRunner};

static JAVA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"version "(\d+)(?:\.(\d+))?[^"]*""#).expect("valid regex"));

static MC_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRuntime {
    pub path: PathBuf,
    pub major: u32,
}

/// Oldest Java major that runs the given server build.
pub fn required_major(flavor: Flavor, version: &str) -> u32 {
    match flavor {
        Flavor::Hytale => 25,
        Flavor::Velocity => 21,
        Flavor::Geyser => 17,
        _ => minecraft_required_major(version),
    }
}

fn minecraft_required_major(version: &str) -> u32 {
    let Some(caps) = MC_VERSION.captures(version) else {
        // Snapshots and unknown schemes: assume a current release.
        return 21;
    };
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let (major, minor, patch) = (part(1), part(2), part(3));

    if major > 1 {
        return 21;
    }
    match (minor, patch) {
        (m, _) if m > 20 => 21,
        (20, p) if p >= 5 => 21,
        (m, _) if m >= 18 => 17,
        (17, _) => 16,
        _ => 8,
    }
}

/// Parses the major version from `java -version` output. Legacy `1.x`
/// numbering maps to `x`.
pub fn parse_major(output: &str) -> Option<u32> {
    let caps = JAVA_VERSION.captures(output)?;
    let first: u32 = caps.get(1)?.as_str().parse().ok()?;
    if first == 1 {
        caps.get(2)?.as_str().parse().ok()
    } else {
        Some(first)
    }
}

async fn probe<R: SystemRunner + ?Sized>(runner: &R, java: &Path) -> Option<JavaRuntime> {
    let program = java.display().to_string();
    let output = runner.run(&program, &["-version"]).await.ok()?;
    if !output.success() {
        return None;
    }
    // The version banner goes to stderr; some builds print it to stdout.
    let major = parse_major(&output.stderr).or_else(|| parse_major(&output.stdout))?;
    debug!(
        log_type = LogType::Java.as_str(),
        "{} reports Java {}", program, major
    );
    Some(JavaRuntime {
        path: java.to_path_buf(),
        major,
    })
}

/// Java binaries of the JDKs under `jvm_root`, newest first by directory name.
fn installed_candidates(jvm_root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(jvm_root) else {
        return Vec::new();
    };
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path().join("bin").join("java"))
        .filter(|p| p.is_file())
        .collect();
    candidates.sort();
    candidates.reverse();
    candidates
}

/// Finds a runtime of at least `required`, installing one when allowed.
pub async fn ensure_runtime<R: SystemRunner + ?Sized>(
    runner: &R,
    config: &JavaConfig,
    required: u32,
) -> Result<JavaRuntime, HostcraftError> {
    let preferred = config
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from("java"));

    let mut best_found = None;
    if let Some(runtime) = probe(runner, &preferred).await {
        if runtime.major >= required {
            info!(
                log_type = LogType::Java.as_str(),
                "Using Java {} at {}",
                runtime.major,
                runtime.path.display()
            );
            return Ok(runtime);
        }
        best_found = Some(runtime.major);
    }

    // An explicitly configured binary is authoritative.
    if config.path.is_some() {
        return Err(HostcraftError::JavaUnavailable {
            required,
            found: best_found,
        });
    }

    if let Some(runtime) = find_installed(runner, config, required).await {
        return Ok(runtime);
    }

    if runner.is_dry_run() {
        let package = config.package_for(required);
        runner.check("apt-get", &["install", "-y", &package]).await?;
        return Ok(JavaRuntime {
            path: preferred,
            major: required,
        });
    }

    if !config.auto_install {
        return Err(HostcraftError::JavaUnavailable {
            required,
            found: best_found,
        });
    }

    let package = config.package_for(required);
    warn!(
        log_type = LogType::Java.as_str(),
        "No Java {} runtime found, installing {}", required, package
    );
    runner.tolerate("apt-get", &["update"]).await?;
    runner
        .check(
            "env",
            &[
                "DEBIAN_FRONTEND=noninteractive",
                "apt-get",
                "install",
                "-y",
                "--no-install-recommends",
                &package,
            ],
        )
        .await?;

    find_installed(runner, config, required)
        .await
        .ok_or(HostcraftError::JavaUnavailable {
            required,
            found: best_found,
        })
}

async fn find_installed<R: SystemRunner + ?Sized>(
    runner: &R,
    config: &JavaConfig,
    required: u32,
) -> Option<JavaRuntime> {
    for candidate in installed_candidates(&config.jvm_root) {
        if let Some(runtime) = probe(runner, &candidate).await {
            if runtime.major >= required {
                info!(
                    log_type = LogType::Java.as_str(),
                    "Using Java {} at {}",
                    runtime.major,
                    runtime.path.display()
                );
                return Some(runtime);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommandOutput, RecordingRunner};

    #[test]
    fn test_parse_major() {
        assert_eq!(
            parse_major("openjdk version \"21.0.2\" 2024-01-16\nOpenJDK Runtime Environment"),
            Some(21)
        );
        assert_eq!(parse_major("java version \"1.8.0_392\""), Some(8));
        assert_eq!(parse_major("openjdk version \"17\" 2021-09-14"), Some(17));
        assert_eq!(parse_major("openjdk version \"25-ea\""), Some(25));
        assert_eq!(parse_major("bash: java: command not found"), None);
    }

    #[test]
    fn test_required_major() {
        assert_eq!(required_major(Flavor::Paper, "1.21.4"), 21);
        assert_eq!(required_major(Flavor::Paper, "1.20.5"), 21);
        assert_eq!(required_major(Flavor::Paper, "1.20.4"), 17);
        assert_eq!(required_major(Flavor::Fabric, "1.18"), 17);
        assert_eq!(required_major(Flavor::Forge, "1.17.1"), 16);
        assert_eq!(required_major(Flavor::Forge, "1.16.5"), 8);
        assert_eq!(required_major(Flavor::Purpur, "24w14a"), 21);
        assert_eq!(required_major(Flavor::Hytale, "latest"), 25);
        assert_eq!(required_major(Flavor::Velocity, "3.4.0-SNAPSHOT"), 21);
    }

    #[tokio::test]
    async fn test_path_java_is_used_when_new_enough() {
        let runner = RecordingRunner::new().with_output(
            "java -version",
            CommandOutput {
                stderr: "openjdk version \"21.0.5\" 2024-10-15".to_string(),
                ..CommandOutput::default()
            },
        );
        let runtime = ensure_runtime(&runner, &JavaConfig::default(), 17)
            .await
            .unwrap();
        assert_eq!(runtime.major, 21);
        assert_eq!(runtime.path, PathBuf::from("java"));
        assert!(!runner.ran("apt-get"));
    }

    #[tokio::test]
    async fn test_configured_java_too_old() {
        let runner = RecordingRunner::new().with_stderr(
            "/opt/jdk8/bin/java -version",
            "java version \"1.8.0_392\"",
        );
        let config = JavaConfig {
            path: Some(PathBuf::from("/opt/jdk8/bin/java")),
            ..JavaConfig::default()
        };
        let err = ensure_runtime(&runner, &config, 21).await.unwrap_err();
        assert!(matches!(
            err,
            HostcraftError::JavaUnavailable {
                required: 21,
                found: Some(8)
            }
        ));
    }

    #[tokio::test]
    async fn test_installs_package_when_missing() {
        let jvm_root = tempfile::TempDir::new().unwrap();
        let runner = RecordingRunner::new().with_status("java -version", 127);
        let config = JavaConfig {
            jvm_root: jvm_root.path().to_path_buf(),
            ..JavaConfig::default()
        };

        let err = ensure_runtime(&runner, &config, 21).await.unwrap_err();

        // Nothing appears under the JVM root, so the install is reported as failed.
        assert!(matches!(err, HostcraftError::JavaUnavailable { .. }));
        assert!(runner.ran("env DEBIAN_FRONTEND=noninteractive apt-get install -y --no-install-recommends openjdk-21-jre-headless"));
    }

    #[tokio::test]
    async fn test_no_auto_install() {
        let jvm_root = tempfile::TempDir::new().unwrap();
        let runner = RecordingRunner::new().with_status("java -version", 127);
        let config = JavaConfig {
            auto_install: false,
            jvm_root: jvm_root.path().to_path_buf(),
            ..JavaConfig::default()
        };
        assert!(ensure_runtime(&runner, &config, 17).await.is_err());
        assert!(!runner.ran("apt-get"));
        assert!(!runner.ran("env"));
    }
}
