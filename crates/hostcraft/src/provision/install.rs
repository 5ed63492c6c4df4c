use std::path::PathBuf;

use hostcraft_auth::HytaleAuthenticator;
use hostcraft_config::LogType;
use hostcraft_net::HttpTransport;
use hostcraft_resolver::{Downloader, Flavor, ResolvedBuild, verify_sha256};
use hostcraft_systemd::{UnitNames, UnitPair, write_units};
use tokio::fs;
use tracing::{info, instrument, warn};

use super::{InstallOptions, Provisioner, startup};
use crate::{
    HostcraftError, SystemRunner,
    java::{self, JavaRuntime},
    server_files,
};

const INSTALL_DIR_MODE: u32 = 0o750;

/// Records the URL the artifact in the install directory came from, so a
/// changed version or build is downloaded again despite the fixed file name.
const ARTIFACT_MARKER: &str = ".hostcraft-artifact";

/// What `install` put in place.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub names: UnitNames,
    pub artifact: PathBuf,
    pub version: String,
    pub build: String,
    pub java: JavaRuntime,
    pub started: bool,
}

impl<T: HttpTransport + Clone, R: SystemRunner> Provisioner<T, R> {
    /// Runs every install step in order. Each step is safe to repeat, so a
    /// failed install can simply be re-run.
    #[instrument(name = "install", skip_all, fields(instance = %self.target.instance_id, flavor = %self.target.flavor))]
    pub async fn install(&self, options: &InstallOptions) -> Result<InstallReport, HostcraftError> {
        self.preflight(options)?;

        self.ensure_account().await?;
        self.create_directories().await?;

        let resolved = self.fetch_artifact(options.force_download).await?;

        let required = java::required_major(self.target.flavor, &resolved.version);
        let java = java::ensure_runtime(&self.runner, &self.config.java, required).await?;

        if self.target.flavor == Flavor::Forge {
            self.run_forge_installer(&java, &resolved, options.force_download)
                .await?;
        }

        self.write_server_files().await?;

        let pair = self.unit_pair(&resolved, &java, options.config_path.as_deref())?;
        self.install_units(&pair).await?;

        if self.target.flavor == Flavor::Hytale && !options.no_start && !self.dry_run() {
            self.authenticate(options).await?;
        }

        self.chown_install_dir().await?;
        self.enable_units(!options.no_start).await?;

        info!(
            log_type = LogType::Provision.as_str(),
            "Installed {} {} as {}",
            self.target.flavor,
            resolved.version,
            self.target.names.service()
        );

        Ok(InstallReport {
            names: self.target.names.clone(),
            artifact: resolved.download.destination.clone(),
            version: resolved.version,
            build: resolved.build,
            java,
            started: !options.no_start,
        })
    }

    /// Checks that need no side effects, so a bad configuration fails before
    /// anything on the host changes.
    fn preflight(&self, options: &InstallOptions) -> Result<(), HostcraftError> {
        self.config.server.memory.validate()?;

        let flavor = self.target.flavor;
        if flavor != Flavor::Hytale && !flavor.is_proxy() && !self.config.server.eula {
            return Err(HostcraftError::EulaNotAccepted {
                flavor: flavor.to_string(),
            });
        }

        if flavor == Flavor::Hytale {
            let Some(path) = options.config_path.as_deref() else {
                return Err(hostcraft_config::ConfigError::Missing(
                    "configuration file (--config) for the hytale launcher",
                )
                .into());
            };
            if !self.dry_run() && !path.is_file() {
                return Err(hostcraft_config::ConfigError::invalid(
                    "--config",
                    path.display().to_string(),
                    "the hytale launcher reads this file at every start, so it must exist",
                )
                .into());
            }
        }
        Ok(())
    }

    async fn ensure_account(&self) -> Result<(), HostcraftError> {
        let user = self.target.names.user();
        let group = self.target.names.group();

        if !self.runner.run("getent", &["group", group]).await?.success() {
            self.runner.check("groupadd", &["--system", group]).await?;
            info!(log_type = LogType::Provision.as_str(), "Created group {}", group);
        }

        if !self.runner.run("getent", &["passwd", user]).await?.success() {
            let home = self.target.install_dir.display().to_string();
            self.runner
                .check(
                    "useradd",
                    &[
                        "--system",
                        "--no-create-home",
                        "--shell",
                        "/usr/sbin/nologin",
                        "--gid",
                        group,
                        "--home-dir",
                        &home,
                        user,
                    ],
                )
                .await?;
            info!(log_type = LogType::Provision.as_str(), "Created user {}", user);
        }
        Ok(())
    }

    async fn create_directories(&self) -> Result<(), HostcraftError> {
        let dir = &self.target.install_dir;
        if self.dry_run() {
            info!(log_type = LogType::Provision.as_str(), "[dry-run] create {}", dir.display());
            return Ok(());
        }

        for sub in ["logs", "backups"] {
            let path = dir.join(sub);
            fs::create_dir_all(&path)
                .await
                .map_err(HostcraftError::io(&path))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, std::fs::Permissions::from_mode(INSTALL_DIR_MODE))
                .await
                .map_err(HostcraftError::io(dir))?;
        }
        Ok(())
    }

    async fn fetch_artifact(&self, force: bool) -> Result<ResolvedBuild, HostcraftError> {
        let resolved = self.resolve().await?;
        let descriptor = &resolved.download;
        let destination = &descriptor.destination;

        if self.dry_run() {
            info!(
                log_type = LogType::Provision.as_str(),
                "[dry-run] download {} to {}",
                descriptor.url,
                destination.display()
            );
            return Ok(resolved);
        }

        let present = fs::metadata(destination)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        let marker_path = self.target.install_dir.join(ARTIFACT_MARKER);
        let recorded = match fs::read_to_string(&marker_path).await {
            Ok(content) => Some(content.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(HostcraftError::io(&marker_path)(e)),
        };
        // An artifact without a marker was placed by hand and is kept.
        let stale = recorded.as_deref().is_some_and(|url| url != descriptor.url);

        if present && !force && !stale {
            info!(
                log_type = LogType::Provision.as_str(),
                "Keeping existing {}",
                destination.display()
            );
            if let Some(expected) = &descriptor.sha256 {
                verify_sha256(destination, expected).await?;
            }
        } else {
            if present && stale {
                info!(
                    log_type = LogType::Provision.as_str(),
                    "Replacing {} with {} {}",
                    destination.display(),
                    resolved.version,
                    resolved.build
                );
            }
            Downloader::new(self.transport.clone()).fetch(descriptor).await?;
        }

        if recorded.as_deref() != Some(descriptor.url.as_str()) {
            fs::write(&marker_path, format!("{}\n", descriptor.url))
                .await
                .map_err(HostcraftError::io(&marker_path))?;
        }

        let is_zip = destination
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if self.target.flavor == Flavor::Hytale && is_zip {
            let archive = destination.display().to_string();
            let dir = self.target.install_dir.display().to_string();
            self.runner
                .check("unzip", &["-o", "-q", &archive, "-d", &dir])
                .await?;
        }

        Ok(resolved)
    }

    async fn run_forge_installer(
        &self,
        java: &JavaRuntime,
        resolved: &ResolvedBuild,
        force: bool,
    ) -> Result<(), HostcraftError> {
        let dir = &self.target.install_dir;
        let installed = startup::forge_args_file(dir, &resolved.version, &resolved.build).is_some()
            || startup::forge_legacy_jar(dir, &resolved.version, &resolved.build).is_some();
        if installed && !force {
            info!(
                log_type = LogType::Provision.as_str(),
                "Forge {}-{} already installed",
                resolved.version,
                resolved.build
            );
            return Ok(());
        }

        // The installer writes into the directory as the service account.
        self.chown_install_dir().await?;

        let java_path = java.path.display().to_string();
        let installer = resolved.download.destination.display().to_string();
        let dir = dir.display().to_string();
        self.runner
            .check(
                "runuser",
                &[
                    "-u",
                    self.target.names.user(),
                    "--",
                    &java_path,
                    "-jar",
                    &installer,
                    "--installServer",
                    &dir,
                ],
            )
            .await?;
        info!(log_type = LogType::Provision.as_str(), "Forge installer finished");
        Ok(())
    }

    async fn write_server_files(&self) -> Result<(), HostcraftError> {
        let dir = &self.target.install_dir;
        let flavor = self.target.flavor;
        if self.dry_run() {
            info!(
                log_type = LogType::Provision.as_str(),
                "[dry-run] write server files in {}",
                dir.display()
            );
            return Ok(());
        }

        if flavor == Flavor::Hytale {
            server_files::write_hytale_config(dir, &self.config).await?;
        } else if !flavor.is_proxy() {
            server_files::write_eula(dir).await?;
            server_files::write_server_properties(dir, &self.config.server).await?;
        }
        Ok(())
    }

    async fn install_units(&self, pair: &UnitPair) -> Result<(), HostcraftError> {
        if self.dry_run() {
            info!(
                log_type = LogType::Systemd.as_str(),
                "[dry-run] {}:\n{}\n{}:\n{}",
                pair.names().service(),
                pair.service,
                pair.names().socket(),
                pair.socket
            );
            return Ok(());
        }
        write_units(&self.config.systemd.unit_dir, pair).await?;
        Ok(())
    }

    /// Populates the token cache so the first service start needs no operator.
    async fn authenticate(&self, options: &InstallOptions) -> Result<(), HostcraftError> {
        let cache_path = self.target.auth_cache_path(&self.config);
        let authenticator = HytaleAuthenticator::new(
            self.transport.clone(),
            self.config.hytale.auth.clone(),
            &cache_path,
        );
        let session = authenticator.session(&options.cancel).await?;
        info!(
            log_type = LogType::Authentication.as_str(),
            "Authenticated as profile {}", session.profile_uuid
        );

        if !cache_path.starts_with(&self.target.install_dir) {
            self.chown(&cache_path, false).await?;
        }
        Ok(())
    }

    async fn chown_install_dir(&self) -> Result<(), HostcraftError> {
        let dir = self.target.install_dir.clone();
        self.chown(&dir, true).await
    }

    async fn chown(&self, path: &std::path::Path, recursive: bool) -> Result<(), HostcraftError> {
        let owner = format!("{}:{}", self.target.names.user(), self.target.names.group());
        let path = path.display().to_string();
        let mut args = Vec::with_capacity(3);
        if recursive {
            args.push("-R");
        }
        args.push(owner.as_str());
        args.push(path.as_str());
        self.runner.check("chown", &args).await?;
        Ok(())
    }

    async fn enable_units(&self, start: bool) -> Result<(), HostcraftError> {
        let service = self.target.names.service();
        let socket = self.target.names.socket();

        self.runner.check("systemctl", &["daemon-reload"]).await?;
        self.runner
            .check("systemctl", &["enable", "--now", &socket])
            .await?;
        self.runner.check("systemctl", &["enable", &service]).await?;

        if start {
            self.runner.check("systemctl", &["start", &service]).await?;
        } else {
            warn!(
                log_type = LogType::Systemd.as_str(),
                "Not starting {}; run `systemctl start {}` when ready", service, service
            );
        }
        Ok(())
    }
}
