use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("Invalid unit name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Failed to write unit file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove unit file {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
