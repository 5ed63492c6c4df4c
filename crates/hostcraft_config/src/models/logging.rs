use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_true")]
    pub use_color: bool,

    #[serde(default = "default_true")]
    pub show_timestamp: bool,

    #[serde(default)]
    pub show_target: bool,

    /// Minimum level (`trace`..`error`); `debug` or `info` when unset.
    #[serde(default)]
    pub min_level: Option<String>,

    /// Per log type levels, keyed by [`LogType::as_str`].
    #[serde(default)]
    pub log_types: HashMap<String, String>,

    #[serde(default)]
    pub exclude_types: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            use_color: true,
            show_timestamp: true,
            show_target: false,
            min_level: None,
            log_types: HashMap::new(),
            exclude_types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    Resolver,
    Download,
    Network,
    Authentication,
    Systemd,
    Provision,
    Java,
    ConfigProvider,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Resolver => "resolver",
            LogType::Download => "download",
            LogType::Network => "network",
            LogType::Authentication => "auth",
            LogType::Systemd => "systemd",
            LogType::Provision => "provision",
            LogType::Java => "java",
            LogType::ConfigProvider => "config",
        }
    }

    pub fn from_name(name: &str) -> Option<LogType> {
        Self::all().iter().copied().find(|t| t.as_str() == name)
    }

    pub fn all() -> &'static [LogType] {
        &[
            LogType::Resolver,
            LogType::Download,
            LogType::Network,
            LogType::Authentication,
            LogType::Systemd,
            LogType::Provision,
            LogType::Java,
            LogType::ConfigProvider,
        ]
    }
}
