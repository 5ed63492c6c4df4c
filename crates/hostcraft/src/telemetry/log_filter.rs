use std::collections::HashMap;

use hostcraft_config::{LogType, LoggingConfig};
use tracing::{Level, Metadata};
use tracing_subscriber::filter::FilterFn;

/// Crates outside the workspace only reach the output at this level or above.
const FOREIGN_LEVEL: Level = Level::WARN;

pub struct HostcraftLogFilter {
    type_levels: HashMap<String, Level>,
    excluded_types: Vec<String>,
    min_level: Level,
}

impl HostcraftLogFilter {
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut type_levels = HashMap::new();

        for (log_type, level_str) in &config.log_types {
            let Some(log_type) = LogType::from_name(log_type) else {
                continue;
            };
            if let Ok(level) = parse_level(level_str) {
                type_levels.insert(log_type.as_str().to_string(), level);
            }
        }

        let min_level = config
            .min_level
            .as_ref()
            .and_then(|l| parse_level(l).ok())
            .unwrap_or(if config.debug { Level::DEBUG } else { Level::INFO });

        Self {
            type_levels,
            excluded_types: config
                .exclude_types
                .iter()
                .filter_map(|t| LogType::from_name(t))
                .map(|t| t.as_str().to_string())
                .collect(),
            min_level,
        }
    }

    pub fn should_log(&self, metadata: &Metadata<'_>) -> bool {
        let target = metadata.target();
        if !target.starts_with("hostcraft") {
            return metadata.level() <= &std::cmp::min(FOREIGN_LEVEL, self.min_level);
        }

        if let Some(log_type) = extract_log_type_from_target(target) {
            if self.excluded_types.iter().any(|t| t == log_type) {
                return false;
            }

            // A per type level may be more verbose than the global one.
            if let Some(&type_level) = self.type_levels.get(log_type) {
                return metadata.level() <= &type_level;
            }
        }

        metadata.level() <= &self.min_level
    }

    pub fn create_filter_fn(self) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
        tracing_subscriber::filter::filter_fn(move |metadata| self.should_log(metadata))
    }
}

fn extract_log_type_from_target(target: &str) -> Option<&'static str> {
    let log_type = match target {
        t if t.starts_with("hostcraft_resolver::download") => LogType::Download,
        t if t.starts_with("hostcraft_resolver") => LogType::Resolver,
        t if t.starts_with("hostcraft_net") => LogType::Network,
        t if t.starts_with("hostcraft_auth") || t.starts_with("hostcraft::provision::launch") => {
            LogType::Authentication
        }
        t if t.starts_with("hostcraft_systemd") => LogType::Systemd,
        t if t.starts_with("hostcraft_config") => LogType::ConfigProvider,
        t if t.starts_with("hostcraft::java") => LogType::Java,
        t if t.starts_with("hostcraft::") || t == "hostcraft" => LogType::Provision,
        _ => return None,
    };
    Some(log_type.as_str())
}

fn parse_level(level_str: &str) -> Result<Level, &'static str> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err("Invalid log level"),
    }
}
