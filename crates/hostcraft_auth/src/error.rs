use std::{io, path::PathBuf};

use hostcraft_net::NetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization failed: {error}{}", description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    AuthorizationError {
        error: String,
        description: Option<String>,
    },

    #[error("The account owns no game profile; a purchased copy is required to run a server")]
    EmptyProfileSet,

    #[error("Profile {requested:?} not found; available profiles: {}", available.join(", "))]
    ProfileNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("Malformed game session response: {body}")]
    MalformedSessionResponse { body: String },

    #[error("Token cache {} is invalid: {reason}", path.display())]
    InvalidOrIncompleteCache { path: PathBuf, reason: String },

    #[error("Unexpected answer from {url} (HTTP {status}): {body}")]
    UnexpectedResponse {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Authentication cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(#[from] NetError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
