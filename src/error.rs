#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvarError {
    #[error("git is required but was not found in PATH")]
    GitNotFound,

    #[error("git error: {0}")]
    Git(String),

    #[error("task '{0}' not found")]
    NotFound(String),

    #[error("invalid task id '{0}'")]
    InvalidTaskId(String),

    #[error("malformed task record at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error at {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("terminal error: {0}")]
    Terminal(String),
}
