use std::{io, path::PathBuf};

use hostcraft_auth::AuthError;
use hostcraft_config::ConfigError;
use hostcraft_net::NetError;
use hostcraft_resolver::ResolveError;
use hostcraft_systemd::UnitError;
use thiserror::Error;

use crate::system::SystemError;

#[derive(Debug, Error)]
pub enum HostcraftError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("The Minecraft EULA must be accepted (server.eula: true or --accept-eula) before installing {flavor}")]
    EulaNotAccepted { flavor: String },

    #[error("Java {required} or newer is required{}", found.map(|f| format!(", found Java {f}")).unwrap_or_default())]
    JavaUnavailable { required: u32, found: Option<u32> },

    #[error("Server artifact missing in {}: {reason}", dir.display())]
    MissingArtifact { dir: PathBuf, reason: String },

    #[error("Refusing to overwrite {}: {source}", path.display())]
    MalformedFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} must run as root")]
    NotRoot(&'static str),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl HostcraftError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| HostcraftError::Io { path, source }
    }
}
