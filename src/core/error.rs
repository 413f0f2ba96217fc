use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployCheckError {
    #[error("Access error: {path}: {reason}")]
    AccessError { path: PathBuf, reason: String },
    #[error("Parse error: {path}: {message}")]
    ParseError { path: PathBuf, message: String },
    #[error("Subprocess failure: `{command}`: {detail}")]
    SubprocessFailure { command: String, detail: String },
    #[error("Subprocess timed out: `{command}` exceeded {limit:?}")]
    Timeout { command: String, limit: Duration },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DeployCheckError {
    pub fn access(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DeployCheckError::AccessError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        DeployCheckError::ParseError {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
