use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use crate::{ConfigError, HostcraftConfig, LogType};

pub const DEFAULT_CONFIG_DIR: &str = "/etc/hostcraft";

pub struct FileProvider;

impl FileProvider {
    /// Default location of an instance configuration file.
    pub fn default_path(instance_id: &str) -> PathBuf {
        Path::new(DEFAULT_CONFIG_DIR).join(format!("{}.yaml", instance_id))
    }

    #[instrument(name = "file_provider: load", fields(path = %path.display()))]
    pub fn try_load_config(path: &Path) -> Result<HostcraftConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            log_type = LogType::ConfigProvider.as_str(),
            "Loaded configuration from {}",
            path.display()
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<HostcraftConfig, serde_yaml::Error> {
        // An empty document deserializes to `null`, which should mean "all defaults".
        if content.trim().is_empty() {
            return Ok(HostcraftConfig::default());
        }

        serde_yaml::from_str(content)
    }
}
