use serde::Deserialize;
use std::collections::BTreeMap;

use crate::ConfigError;

pub const LATEST: &str = "latest";

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct ServerConfig {
    /// Server distribution, e.g. `paper`, `fabric` or `hytale`.
    pub flavor: Option<String>,
    pub version: Option<String>,
    pub build: Option<String>,

    /// Direct artifact URL. Required for Hytale, overrides resolution otherwise.
    pub download_url: Option<String>,

    /// Expected SHA-256 of the artifact, hex encoded.
    pub sha256: Option<String>,

    #[serde(default)]
    pub memory: MemoryConfig,

    pub port: Option<u16>,
    pub motd: Option<String>,
    pub max_players: Option<u32>,

    #[serde(default)]
    pub eula: bool,

    /// Extra `server.properties` entries.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Extra arguments appended after the jar on the Java command line.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl ServerConfig {
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(LATEST)
    }

    pub fn build(&self) -> &str {
        self.build.as_deref().unwrap_or(LATEST)
    }

    pub fn merge(&mut self, other: ServerConfig) {
        if other.flavor.is_some() {
            self.flavor = other.flavor;
        }
        if other.version.is_some() {
            self.version = other.version;
        }
        if other.build.is_some() {
            self.build = other.build;
        }
        if other.download_url.is_some() {
            self.download_url = other.download_url;
        }
        if other.sha256.is_some() {
            self.sha256 = other.sha256;
        }
        self.memory.merge(other.memory);
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.motd.is_some() {
            self.motd = other.motd;
        }
        if other.max_players.is_some() {
            self.max_players = other.max_players;
        }
        self.eula |= other.eula;
        self.properties.extend(other.properties);
        if !other.extra_args.is_empty() {
            self.extra_args = other.extra_args;
        }
    }
}

/// Java heap sizes, in the `-Xmx` notation (`512M`, `4G`). Unset halves
/// fall back to 1G and 2G.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MemoryConfig {
    pub min: Option<String>,
    pub max: Option<String>,
}

const DEFAULT_MIN_HEAP: &str = "1G";
const DEFAULT_MAX_HEAP: &str = "2G";

impl MemoryConfig {
    pub fn min(&self) -> &str {
        self.min.as_deref().unwrap_or(DEFAULT_MIN_HEAP)
    }

    pub fn max(&self) -> &str {
        self.max.as_deref().unwrap_or(DEFAULT_MAX_HEAP)
    }

    pub fn merge(&mut self, other: MemoryConfig) {
        if other.min.is_some() {
            self.min = other.min;
        }
        if other.max.is_some() {
            self.max = other.max;
        }
    }

    /// Rejects sizes the JVM would refuse at service start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("server.memory.min", self.min()),
            ("server.memory.max", self.max()),
        ];
        for (field, size) in sizes {
            if !Self::is_valid_size(size) {
                return Err(ConfigError::invalid(
                    field,
                    size,
                    "expected a number followed by K, M or G",
                ));
            }
        }
        Ok(())
    }

    pub fn is_valid_size(size: &str) -> bool {
        let Some(unit) = size.chars().last() else {
            return false;
        };
        let digits = &size[..size.len() - unit.len_utf8()];
        matches!(unit, 'K' | 'k' | 'M' | 'm' | 'G' | 'g')
            && !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
    }
}
