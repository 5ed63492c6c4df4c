mod install;
pub mod launch;
pub mod startup;
mod uninstall;

use std::path::{Path, PathBuf};

use hostcraft_config::HostcraftConfig;
use hostcraft_net::HttpTransport;
use hostcraft_resolver::{Flavor, ResolvedBuild};
use hostcraft_systemd::UnitNames;
use tokio_util::sync::CancellationToken;

use crate::{HostcraftError, SystemRunner, java::JavaRuntime};

pub use install::InstallReport;

pub const DEFAULT_INSTALL_ROOT: &str = "/opt/hostcraft";
pub const AUTH_CACHE_FILE: &str = ".hytale-auth.json";

/// Installation identity derived from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub instance_id: String,
    pub flavor: Flavor,
    pub install_dir: PathBuf,
    pub names: UnitNames,
}

impl Target {
    pub fn from_config(config: &HostcraftConfig) -> Result<Self, HostcraftError> {
        let instance_id = config.instance_id()?.to_string();
        let flavor: Flavor = config.flavor()?.parse()?;
        let install_dir = config
            .install_dir
            .clone()
            .unwrap_or_else(|| Path::new(DEFAULT_INSTALL_ROOT).join(&instance_id));
        let names = UnitNames::new(
            flavor.product().as_str(),
            &instance_id,
            &config.systemd.runtime_dir,
        )?;

        Ok(Self {
            instance_id,
            flavor,
            install_dir,
            names,
        })
    }

    pub fn auth_cache_path(&self, config: &HostcraftConfig) -> PathBuf {
        config
            .hytale
            .auth
            .cache_file
            .clone()
            .unwrap_or_else(|| self.install_dir.join(AUTH_CACHE_FILE))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub no_start: bool,
    pub force_download: bool,
    /// Configuration file the Hytale unit passes back to `hostcraft launch`.
    pub config_path: Option<PathBuf>,
    /// Interrupts the Hytale device authorization wait.
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Default)]
pub struct UninstallOptions {
    pub keep_data: bool,
    pub forget_auth: bool,
}

/// Runs provisioning steps for one installation. All host changes go through
/// the runner, the transport or the filesystem under `install_dir` and the
/// unit directory.
pub struct Provisioner<T: HttpTransport, R: SystemRunner> {
    config: HostcraftConfig,
    target: Target,
    transport: T,
    runner: R,
}

impl<T: HttpTransport + Clone, R: SystemRunner> Provisioner<T, R> {
    pub fn new(config: HostcraftConfig, transport: T, runner: R) -> Result<Self, HostcraftError> {
        let target = Target::from_config(&config)?;
        Ok(Self {
            config,
            target,
            transport,
            runner,
        })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn config(&self) -> &HostcraftConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn dry_run(&self) -> bool {
        self.runner.is_dry_run()
    }

    /// Resolves the configured build without downloading it.
    pub async fn resolve(&self) -> Result<ResolvedBuild, HostcraftError> {
        let request = hostcraft_resolver::BuildRequest::from_config(
            &self.config,
            self.target.install_dir.clone(),
        )?;
        let resolver =
            hostcraft_resolver::Resolver::new(self.transport.clone(), self.config.apis.clone());
        Ok(resolver.resolve(&request).await?)
    }

    /// Renders the unit pair for an already resolved build and runtime.
    pub fn unit_pair(
        &self,
        resolved: &ResolvedBuild,
        java: &JavaRuntime,
        config_path: Option<&Path>,
    ) -> Result<hostcraft_systemd::UnitPair, HostcraftError> {
        startup::unit_pair(&self.config, &self.target, resolved, java, config_path)
    }
}
