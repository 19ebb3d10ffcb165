use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatrixError>;

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing dependency command: {command}")]
    MissingCommand { command: String },

    #[error("profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("template file missing: {path}")]
    MissingTemplate { path: PathBuf },

    #[error("{command} did not produce expected file: {path}")]
    MissingArtifact { command: String, path: PathBuf },

    #[error("external command failed: {command} (exit={exit_code}){detail}")]
    ExternalCommandFailed {
        command: String,
        exit_code: i32,
        detail: String,
    },

    #[error("external command timed out: {command} ({seconds}s)")]
    ExternalCommandTimedOut { command: String, seconds: u64 },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl MatrixError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::ExternalCommandFailed { exit_code, .. } => *exit_code,
            Self::ExternalCommandTimedOut { .. } => 124,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
