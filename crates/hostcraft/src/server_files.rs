//! Files the server reads at startup.

use std::{collections::BTreeMap, path::Path};

use hostcraft_config::{HostcraftConfig, LogType, ServerConfig};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::debug;

use crate::HostcraftError;

pub const EULA_FILE: &str = "eula.txt";
pub const PROPERTIES_FILE: &str = "server.properties";
pub const HYTALE_CONFIG_FILE: &str = "config.json";

pub const DEFAULT_HYTALE_PORT: u16 = 5520;

pub async fn write_eula(dir: &Path) -> Result<(), HostcraftError> {
    let path = dir.join(EULA_FILE);
    let content = "# Accepted through hostcraft (https://aka.ms/MinecraftEULA)\neula=true\n";
    fs::write(&path, content)
        .await
        .map_err(HostcraftError::io(&path))?;
    debug!(log_type = LogType::Provision.as_str(), "Wrote {}", path.display());
    Ok(())
}

/// Merges configured values into an existing `server.properties` body.
/// Keys the operator set by hand survive; configured keys win.
pub fn render_properties(existing: &str, server: &ServerConfig) -> String {
    let mut properties: BTreeMap<String, String> = existing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let (key, value) = line.split_once(['=', ':'])?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    if let Some(port) = server.port {
        properties.insert("server-port".to_string(), port.to_string());
    }
    if let Some(motd) = &server.motd {
        properties.insert("motd".to_string(), motd.clone());
    }
    if let Some(max_players) = server.max_players {
        properties.insert("max-players".to_string(), max_players.to_string());
    }
    for (key, value) in &server.properties {
        properties.insert(key.clone(), value.clone());
    }

    let mut out = String::from("# Managed by hostcraft; unknown keys are preserved\n");
    for (key, value) in properties {
        out.push_str(&key);
        out.push('=');
        out.push_str(&value);
        out.push('\n');
    }
    out
}

pub async fn write_server_properties(
    dir: &Path,
    server: &ServerConfig,
) -> Result<(), HostcraftError> {
    let path = dir.join(PROPERTIES_FILE);
    let existing = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(HostcraftError::io(&path)(e)),
    };
    fs::write(&path, render_properties(&existing, server))
        .await
        .map_err(HostcraftError::io(&path))?;
    debug!(log_type = LogType::Provision.as_str(), "Wrote {}", path.display());
    Ok(())
}

/// Updates the Hytale server `config.json`, keeping keys it does not manage.
/// An existing body that is not a JSON object is an error.
pub fn render_hytale_config(
    existing: Option<&str>,
    config: &HostcraftConfig,
) -> Result<String, serde_json::Error> {
    let mut root = match existing {
        Some(content) => serde_json::from_str::<Map<String, Value>>(content)?,
        None => Map::new(),
    };

    if let Some(name) = &config.hytale.server_name {
        root.insert("ServerName".to_string(), Value::from(name.clone()));
    }
    if let Some(motd) = &config.server.motd {
        root.insert("MOTD".to_string(), Value::from(motd.clone()));
    }
    if let Some(max_players) = config.server.max_players {
        root.insert("MaxPlayers".to_string(), Value::from(max_players));
    }

    let mut out = serde_json::to_string_pretty(&Value::Object(root))?;
    out.push('\n');
    Ok(out)
}

pub async fn write_hytale_config(
    dir: &Path,
    config: &HostcraftConfig,
) -> Result<(), HostcraftError> {
    let path = dir.join(HYTALE_CONFIG_FILE);
    let existing = match fs::read_to_string(&path).await {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(HostcraftError::io(&path)(e)),
    };
    let rendered = render_hytale_config(existing.as_deref(), config).map_err(|source| {
        HostcraftError::MalformedFile {
            path: path.clone(),
            source,
        }
    })?;
    fs::write(&path, rendered)
        .await
        .map_err(HostcraftError::io(&path))?;
    debug!(log_type = LogType::Provision.as_str(), "Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_preserve_manual_keys() {
        let existing = "#Minecraft server properties\nlevel-seed=42\nserver-port=25565\nmotd=old\n";
        let server = ServerConfig {
            port: Some(25570),
            motd: Some("Welcome".to_string()),
            properties: [("difficulty".to_string(), "hard".to_string())].into(),
            ..ServerConfig::default()
        };

        let rendered = render_properties(existing, &server);
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines.contains(&"level-seed=42"));
        assert!(lines.contains(&"server-port=25570"));
        assert!(lines.contains(&"motd=Welcome"));
        assert!(lines.contains(&"difficulty=hard"));
        assert!(!lines.contains(&"motd=old"));
    }

    #[test]
    fn test_properties_without_existing_file() {
        let rendered = render_properties("", &ServerConfig::default());
        assert_eq!(rendered.lines().filter(|l| !l.starts_with('#')).count(), 0);
    }

    #[test]
    fn test_hytale_config_merges_object() {
        let mut config = HostcraftConfig::default();
        config.hytale.server_name = Some("Orbis".to_string());
        config.server.max_players = Some(40);

        let rendered =
            render_hytale_config(Some(r#"{"Password":"","MaxPlayers":10}"#), &config).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["ServerName"], "Orbis");
        assert_eq!(value["MaxPlayers"], 40);
        assert_eq!(value["Password"], "");
    }

    #[test]
    fn test_hytale_config_rejects_malformed_body() {
        let config = HostcraftConfig::default();
        assert!(render_hytale_config(Some("not json"), &config).is_err());
        assert!(render_hytale_config(Some("[1, 2]"), &config).is_err());
        assert_eq!(render_hytale_config(None, &config).unwrap().trim(), "{}");
    }

    #[tokio::test]
    async fn test_malformed_config_is_left_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(HYTALE_CONFIG_FILE);
        std::fs::write(&path, "{ \"ServerName\": ").unwrap();

        let err = write_hytale_config(dir.path(), &HostcraftConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, HostcraftError::MalformedFile { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"ServerName\": ");
    }
}
