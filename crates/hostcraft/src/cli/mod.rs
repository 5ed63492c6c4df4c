//! Command line surface of the `hostcraft` binary.

pub mod options;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use hostcraft_auth::{CancellationToken, GameSession, HytaleAuthenticator};
use hostcraft_config::{FileProvider, HostcraftConfig, LogType};
use hostcraft_net::ReqwestTransport;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    DryRunRunner, HostcraftError, InstallOptions, ProcessRunner, Provisioner, SystemRunner, Target,
    UninstallOptions,
    java::{self, JavaRuntime},
    provision::launch,
};

pub use options::{AuthArgs, InstallArgs, LaunchArgs, ServerArgs, UninstallArgs};

#[derive(Parser, Debug)]
#[command(name = "hostcraft", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file; defaults to /etc/hostcraft/<instance-id>.yaml when it exists
    #[arg(long, global = true, env = "HOSTCRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "HOSTCRAFT_INSTANCE_ID")]
    pub instance_id: Option<String>,

    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the server, its account and its systemd units
    Install(InstallArgs),
    /// Stop the server and remove what install created
    Uninstall(UninstallArgs),
    /// Print the download URL of the configured build
    Resolve(ServerArgs),
    /// Print the service and socket units without installing anything
    RenderUnits(ServerArgs),
    /// Run the Hytale session flow and report the session
    Auth(AuthArgs),
    /// Start a Hytale server with a fresh session (unit ExecStart)
    Launch(LaunchArgs),
}

impl Commands {
    fn overrides(&self) -> HostcraftConfig {
        match self {
            Commands::Install(args) => args.server.overrides(),
            Commands::Resolve(args) | Commands::RenderUnits(args) => args.overrides(),
            Commands::Auth(args) => args.overrides(),
            Commands::Uninstall(_) | Commands::Launch(_) => HostcraftConfig::default(),
        }
    }
}

impl Cli {
    /// Configuration file to read: the explicit one, else the instance
    /// default when it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }
        let default = FileProvider::default_path(self.instance_id.as_deref()?);
        default.is_file().then_some(default)
    }

    /// Loads the file configuration and applies command line overrides.
    /// Also returns the absolute path of the file that was read.
    pub fn load_config(&self) -> Result<(HostcraftConfig, Option<PathBuf>), HostcraftError> {
        let path = self.config_path();
        let mut config = match &path {
            Some(path) => FileProvider::try_load_config(path)?,
            None => HostcraftConfig::default(),
        };

        let mut overrides = self.command.overrides();
        overrides.instance_id = self.instance_id.clone();
        overrides.logging.debug = self.debug;
        config.merge(overrides);

        let path = path.map(|p| std::path::absolute(&p).unwrap_or(p));
        Ok((config, path))
    }
}

pub async fn run(
    command: Commands,
    config: HostcraftConfig,
    config_path: Option<PathBuf>,
) -> Result<(), HostcraftError> {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match command {
        Commands::Install(args) => install(config, config_path, args, cancel).await,
        Commands::Uninstall(args) => uninstall(config, args).await,
        Commands::Resolve(_) => resolve(config).await,
        Commands::RenderUnits(_) => render_units(config, config_path).await,
        Commands::Auth(args) => auth(config, args, cancel).await,
        Commands::Launch(args) => launch(config, args, cancel).await,
    }
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(log_type = LogType::Provision.as_str(), "Interrupted");
            cancel.cancel();
        }
    });
}

#[cfg(unix)]
fn require_root(command: &'static str) -> Result<(), HostcraftError> {
    if nix::unistd::Uid::effective().is_root() {
        Ok(())
    } else {
        Err(HostcraftError::NotRoot(command))
    }
}

#[cfg(not(unix))]
fn require_root(command: &'static str) -> Result<(), HostcraftError> {
    Err(HostcraftError::NotRoot(command))
}

async fn install(
    mut config: HostcraftConfig,
    config_path: Option<PathBuf>,
    args: InstallArgs,
    cancel: CancellationToken,
) -> Result<(), HostcraftError> {
    if config.instance_id.is_none() {
        let id = Uuid::new_v4().to_string();
        info!(
            log_type = LogType::Provision.as_str(),
            "No instance id configured, using {}", id
        );
        config.instance_id = Some(id);
    }

    let options = InstallOptions {
        no_start: args.no_start,
        force_download: args.force_download,
        config_path,
        cancel,
    };
    let transport = ReqwestTransport::new()?;

    if args.dry_run {
        run_install(Provisioner::new(config, transport, DryRunRunner)?, &options).await
    } else {
        require_root("install")?;
        run_install(Provisioner::new(config, transport, ProcessRunner)?, &options).await
    }
}

async fn run_install<R: SystemRunner>(
    provisioner: Provisioner<ReqwestTransport, R>,
    options: &InstallOptions,
) -> Result<(), HostcraftError> {
    let report = provisioner.install(options).await?;
    println!("instance:  {}", provisioner.target().instance_id);
    println!("service:   {}", report.names.service());
    println!("socket:    {}", report.names.socket());
    println!("console:   {}", report.names.fifo_path().display());
    println!("build:     {} {}", report.version, report.build);
    println!("artifact:  {}", report.artifact.display());
    println!("java:      {} ({})", report.java.major, report.java.path.display());
    println!("started:   {}", report.started);
    Ok(())
}

async fn uninstall(config: HostcraftConfig, args: UninstallArgs) -> Result<(), HostcraftError> {
    let options = UninstallOptions {
        keep_data: args.keep_data,
        forget_auth: args.forget_auth,
    };
    let transport = ReqwestTransport::new()?;

    if args.dry_run {
        Provisioner::new(config, transport, DryRunRunner)?
            .uninstall(&options)
            .await
    } else {
        require_root("uninstall")?;
        Provisioner::new(config, transport, ProcessRunner)?
            .uninstall(&options)
            .await
    }
}

async fn resolve(config: HostcraftConfig) -> Result<(), HostcraftError> {
    let provisioner = Provisioner::new(config, ReqwestTransport::new()?, DryRunRunner)?;
    let resolved = provisioner.resolve().await?;
    println!("{}", resolved.download.url);
    Ok(())
}

async fn render_units(
    config: HostcraftConfig,
    config_path: Option<PathBuf>,
) -> Result<(), HostcraftError> {
    let provisioner = Provisioner::new(config, ReqwestTransport::new()?, DryRunRunner)?;
    let resolved = provisioner.resolve().await?;

    // Rendering never probes or installs a runtime.
    let java = JavaRuntime {
        path: provisioner
            .config()
            .java
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("java")),
        major: java::required_major(provisioner.target().flavor, &resolved.version),
    };

    let pair = provisioner.unit_pair(&resolved, &java, config_path.as_deref())?;
    println!("# {}", pair.names().service());
    println!("{}", pair.service);
    println!("# {}", pair.names().socket());
    println!("{}", pair.socket);
    Ok(())
}

/// What `hostcraft auth` reports. Tokens are never part of it.
#[derive(Debug, Serialize)]
struct SessionSummary {
    profile_uuid: String,
    username: Option<String>,
    expires_at: Option<String>,
    expires_in_secs: Option<i64>,
    cache_file: PathBuf,
}

impl SessionSummary {
    fn new(session: &GameSession, cache_file: &Path, now: DateTime<Utc>) -> Self {
        let expires_in_secs = session
            .expires_at
            .as_deref()
            .and_then(|at| DateTime::parse_from_rfc3339(at).ok())
            .map(|at| (at.with_timezone(&Utc) - now).num_seconds());

        Self {
            profile_uuid: session.profile_uuid.clone(),
            username: session.username.clone(),
            expires_at: session.expires_at.clone(),
            expires_in_secs,
            cache_file: cache_file.to_path_buf(),
        }
    }
}

async fn auth(
    config: HostcraftConfig,
    args: AuthArgs,
    cancel: CancellationToken,
) -> Result<(), HostcraftError> {
    let target = Target::from_config(&config)?;
    let cache_file = target.auth_cache_path(&config);
    let authenticator = HytaleAuthenticator::new(
        ReqwestTransport::new()?,
        config.hytale.auth.clone(),
        &cache_file,
    );
    let session = authenticator.session(&cancel).await?;
    let summary = SessionSummary::new(&session, &cache_file, Utc::now());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match &summary.username {
        Some(name) => println!("profile:    {} ({})", name, summary.profile_uuid),
        None => println!("profile:    {}", summary.profile_uuid),
    }
    match (&summary.expires_at, summary.expires_in_secs) {
        (Some(at), Some(secs)) => println!("expires:    {} (in {} min)", at, secs / 60),
        (Some(at), None) => println!("expires:    {}", at),
        _ => println!("expires:    unknown"),
    }
    println!("cache:      {}", summary.cache_file.display());
    Ok(())
}

#[cfg(unix)]
async fn launch(
    config: HostcraftConfig,
    args: LaunchArgs,
    cancel: CancellationToken,
) -> Result<(), HostcraftError> {
    let plan = launch::prepare(&config, ReqwestTransport::new()?, args.java, &cancel).await?;
    Err(launch::exec(&plan))
}

#[cfg(not(unix))]
async fn launch(
    _config: HostcraftConfig,
    args: LaunchArgs,
    _cancel: CancellationToken,
) -> Result<(), HostcraftError> {
    let program = args.java.unwrap_or_else(|| PathBuf::from("java"));
    Err(HostcraftError::io(program)(std::io::ErrorKind::Unsupported.into()))
}
