use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemdConfig {
    pub unit_dir: PathBuf,
    pub runtime_dir: PathBuf,
    pub limit_nofile: u64,
    pub tasks_max: u32,
    pub restart_sec: u32,
}

impl Default for SystemdConfig {
    fn default() -> Self {
        Self {
            unit_dir: PathBuf::from("/etc/systemd/system"),
            runtime_dir: PathBuf::from("/run"),
            limit_nofile: 65535,
            tasks_max: 4096,
            restart_sec: 10,
        }
    }
}
