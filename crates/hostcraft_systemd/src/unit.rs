use std::{fmt, path::PathBuf};

use hostcraft_config::SystemdConfig;

use crate::{StartupCommand, UnitNames, command::quote_arg};

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceUnit {
    pub description: String,
    pub names: UnitNames,
    pub working_directory: PathBuf,
    pub exec_start: StartupCommand,
    pub environment: Vec<(String, String)>,
    pub limit_nofile: u64,
    pub tasks_max: u32,
    pub restart_sec: u32,
}

impl ServiceUnit {
    pub fn new(
        description: impl Into<String>,
        names: UnitNames,
        working_directory: impl Into<PathBuf>,
        exec_start: StartupCommand,
        limits: &SystemdConfig,
    ) -> Self {
        Self {
            description: description.into(),
            names,
            working_directory: working_directory.into(),
            exec_start,
            environment: Vec::new(),
            limit_nofile: limits.limit_nofile,
            tasks_max: limits.tasks_max,
            restart_sec: limits.restart_sec,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for ServiceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let socket = self.names.socket();

        writeln!(f, "[Unit]")?;
        writeln!(f, "Description={}", self.description)?;
        writeln!(f, "After=network-online.target {}", socket)?;
        writeln!(f, "Wants=network-online.target")?;
        writeln!(f, "Requires={}", socket)?;
        writeln!(f)?;

        writeln!(f, "[Service]")?;
        writeln!(f, "Type=simple")?;
        writeln!(f, "User={}", self.names.user())?;
        writeln!(f, "Group={}", self.names.group())?;
        writeln!(f, "WorkingDirectory={}", self.working_directory.display())?;
        for (key, value) in &self.environment {
            writeln!(f, "Environment={}", quote_arg(&format!("{}={}", key, value)))?;
        }
        writeln!(f, "ExecStart={}", self.exec_start)?;
        writeln!(f, "Sockets={}", socket)?;
        writeln!(f, "StandardInput=socket")?;
        writeln!(f, "StandardOutput=journal")?;
        writeln!(f, "StandardError=journal")?;
        writeln!(f, "Restart=on-failure")?;
        writeln!(f, "RestartSec={}", self.restart_sec)?;
        writeln!(f, "LimitNOFILE={}", self.limit_nofile)?;
        writeln!(f, "TasksMax={}", self.tasks_max)?;
        writeln!(f)?;

        writeln!(f, "[Install]")?;
        writeln!(f, "WantedBy=multi-user.target")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocketUnit {
    pub names: UnitNames,
}

impl SocketUnit {
    pub fn new(names: UnitNames) -> Self {
        Self { names }
    }
}

impl fmt::Display for SocketUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let service = self.names.service();

        writeln!(f, "[Unit]")?;
        writeln!(f, "Description=Console input for {}", service)?;
        writeln!(f, "PartOf={}", service)?;
        writeln!(f)?;

        writeln!(f, "[Socket]")?;
        writeln!(f, "ListenFIFO={}", self.names.fifo_path().display())?;
        writeln!(f, "SocketMode=0660")?;
        writeln!(f, "SocketUser={}", self.names.user())?;
        writeln!(f, "SocketGroup={}", self.names.group())?;
        writeln!(f, "DirectoryMode=0750")?;
        writeln!(f, "RemoveOnStop=true")?;
        writeln!(f)?;

        writeln!(f, "[Install]")?;
        writeln!(f, "WantedBy=sockets.target")
    }
}

/// Service and socket bound 1:1 through the shared base name.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPair {
    pub service: ServiceUnit,
    pub socket: SocketUnit,
}

impl UnitPair {
    pub fn new(service: ServiceUnit) -> Self {
        let socket = SocketUnit::new(service.names.clone());
        Self { service, socket }
    }

    pub fn names(&self) -> &UnitNames {
        &self.service.names
    }
}
