//! Provisioning of game servers as systemd services.
//!
//! `hostcraft install` resolves and downloads a server build, prepares a
//! dedicated account, a Java runtime and the server files, then hands the
//! process to a service/socket unit pair. Everything after that belongs to
//! systemd.

pub mod cli;
mod error;
pub mod java;
pub mod provision;
pub mod server_files;
pub mod system;
pub mod telemetry;

pub use error::HostcraftError;
pub use provision::{InstallOptions, InstallReport, Provisioner, Target, UninstallOptions};
pub use system::{
    CommandOutput, DryRunRunner, ProcessRunner, RecordingRunner, SystemError, SystemRunner,
};
