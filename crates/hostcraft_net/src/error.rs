use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NetError {
    pub fn request(url: &str, error: impl ToString) -> Self {
        NetError::Request {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
