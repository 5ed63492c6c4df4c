use std::path::PathBuf;

use clap::Args;
use hostcraft_config::HostcraftConfig;

/// Server settings that may override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Server flavor (paper, fabric, forge, velocity, geyser, purpur, pufferfish, folia, hytale)
    #[arg(long)]
    pub flavor: Option<String>,

    /// Game version, or `latest`
    #[arg(long = "server-version")]
    pub version: Option<String>,

    /// Build or loader version, or `latest`
    #[arg(long)]
    pub build: Option<String>,

    /// Skip resolution and download this URL
    #[arg(long)]
    pub download_url: Option<String>,

    /// Expected SHA-256 of the artifact
    #[arg(long)]
    pub sha256: Option<String>,

    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Initial heap size, e.g. 1G
    #[arg(long)]
    pub min_memory: Option<String>,

    /// Maximum heap size, e.g. 4G
    #[arg(long)]
    pub max_memory: Option<String>,

    /// Accept the Minecraft EULA (https://aka.ms/MinecraftEULA)
    #[arg(long)]
    pub accept_eula: bool,

    /// Java binary to use instead of the one on PATH
    #[arg(long)]
    pub java: Option<PathBuf>,
}

impl ServerArgs {
    pub fn overrides(&self) -> HostcraftConfig {
        let mut config = HostcraftConfig {
            install_dir: self.install_dir.clone(),
            ..HostcraftConfig::default()
        };

        let server = &mut config.server;
        server.flavor = self.flavor.clone();
        server.version = self.version.clone();
        server.build = self.build.clone();
        server.download_url = self.download_url.clone();
        server.sha256 = self.sha256.clone();
        server.port = self.port;
        server.eula = self.accept_eula;
        server.memory.min = self.min_memory.clone();
        server.memory.max = self.max_memory.clone();

        config.java.path = self.java.clone();
        config
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Enable the units without starting the service
    #[arg(long)]
    pub no_start: bool,

    /// Download the artifact even if it is already present
    #[arg(long)]
    pub force_download: bool,

    /// Print the commands and units instead of applying them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UninstallArgs {
    /// Keep the install directory (worlds, configuration, logs)
    #[arg(long)]
    pub keep_data: bool,

    /// Also delete the cached Hytale refresh token
    #[arg(long)]
    pub forget_auth: bool,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Profile (username or UUID) to create the session for
    #[arg(long)]
    pub profile: Option<String>,

    /// Print the session summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl AuthArgs {
    pub fn overrides(&self) -> HostcraftConfig {
        let mut config = HostcraftConfig::default();
        config.hytale.auth.profile = self.profile.clone();
        config
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct LaunchArgs {
    /// Java binary; the unit sets it to the runtime chosen at install time
    #[arg(long, env = "HOSTCRAFT_JAVA")]
    pub java: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_flag_keeps_file_half() {
        let mut config = HostcraftConfig::default();
        config.server.memory.min = Some("4G".to_string());
        config.server.memory.max = Some("8G".to_string());

        config.merge(
            ServerArgs {
                max_memory: Some("2G".to_string()),
                ..ServerArgs::default()
            }
            .overrides(),
        );
        assert_eq!(config.server.memory.min(), "4G");
        assert_eq!(config.server.memory.max(), "2G");

        config.merge(
            ServerArgs {
                max_memory: Some("16G".to_string()),
                ..ServerArgs::default()
            }
            .overrides(),
        );
        assert_eq!(config.server.memory.min(), "4G");
        assert_eq!(config.server.memory.max(), "16G");
    }

    #[test]
    fn test_heap_flag_without_file_value() {
        let config = ServerArgs {
            max_memory: Some("8G".to_string()),
            ..ServerArgs::default()
        }
        .overrides();
        assert_eq!(config.server.memory.min(), "1G");
        assert_eq!(config.server.memory.max(), "8G");
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let mut config = HostcraftConfig::default();
        config.server.flavor = Some("fabric".to_string());
        config.server.port = Some(25570);
        config.merge(ServerArgs::default().overrides());

        assert_eq!(config.server.flavor.as_deref(), Some("fabric"));
        assert_eq!(config.server.port, Some(25570));
        assert!(!config.server.eula);
    }
}
