//! Error type for snapshot collection and loading.
//!
//! The correlation engine never fails; only the code that talks to the AWS
//! CLI or the filesystem produces these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SgMapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{command}` exited with {status}: {stderr}")]
    AwsCli {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` still throttled after {attempts} attempts")]
    Throttled { command: String, attempts: u32 },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SgMapError>;
