pub mod error;
pub mod models;
pub mod provider;

pub use error::ConfigError;
pub use models::apis::ApiEndpoints;
pub use models::hostcraft::HostcraftConfig;
pub use models::hytale::{HytaleAuthConfig, HytaleEndpoints, HytaleServerConfig};
pub use models::java::JavaConfig;
pub use models::logging::{LogType, LoggingConfig};
pub use models::server::{MemoryConfig, ServerConfig};
pub use models::systemd::SystemdConfig;
pub use provider::file::FileProvider;

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::FileProvider;

    #[test]
    fn test_file_provider() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("survival.yaml");

        fs::write(
            &config_path,
            "instance_id: survival\nserver:\n  flavor: paper\n  version: '1.20.4'\n  eula: true\n",
        )
        .unwrap();

        let config = FileProvider::try_load_config(&config_path).unwrap();
        assert_eq!(config.instance_id.as_deref(), Some("survival"));
        assert_eq!(config.server.flavor.as_deref(), Some("paper"));
        assert_eq!(config.server.version(), "1.20.4");
        assert_eq!(config.server.build(), "latest");
        assert!(config.server.eula);
        assert_eq!(config.apis.papermc, "https://api.papermc.io");
    }
}
