use serde::Deserialize;
use std::path::PathBuf;

use super::{
    apis::ApiEndpoints, hytale::HytaleServerConfig, java::JavaConfig, logging::LoggingConfig,
    server::ServerConfig, systemd::SystemdConfig,
};
use crate::ConfigError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HostcraftConfig {
    /// Opaque identifier of the installation, usually a UUID.
    pub instance_id: Option<String>,
    pub install_dir: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub java: JavaConfig,

    #[serde(default)]
    pub hytale: HytaleServerConfig,

    #[serde(default)]
    pub apis: ApiEndpoints,

    #[serde(default)]
    pub systemd: SystemdConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HostcraftConfig {
    /// Instance identifier, restricted to characters that are safe in user
    /// names, unit names and paths.
    pub fn instance_id(&self) -> Result<&str, ConfigError> {
        let id = self
            .instance_id
            .as_deref()
            .ok_or(ConfigError::Missing("instance_id"))?;

        if id.is_empty() || id.len() > 64 {
            return Err(ConfigError::invalid(
                "instance_id",
                id,
                "must be between 1 and 64 characters",
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::invalid(
                "instance_id",
                id,
                "only letters, digits, '-' and '_' are allowed",
            ));
        }
        Ok(id)
    }

    pub fn flavor(&self) -> Result<&str, ConfigError> {
        self.server
            .flavor
            .as_deref()
            .ok_or(ConfigError::Missing("server.flavor"))
    }

    pub fn merge(&mut self, other: HostcraftConfig) {
        if let Some(instance_id) = other.instance_id {
            self.instance_id = Some(instance_id);
        }

        if let Some(install_dir) = other.install_dir {
            self.install_dir = Some(install_dir);
        }

        self.server.merge(other.server);

        if other.java.path.is_some() {
            self.java.path = other.java.path;
        }

        if other.hytale.auth.profile.is_some() {
            self.hytale.auth.profile = other.hytale.auth.profile;
        }

        if other.hytale.auth.cache_file.is_some() {
            self.hytale.auth.cache_file = other.hytale.auth.cache_file;
        }

        if other.logging.debug {
            self.logging.debug = true;
        }
    }
}
