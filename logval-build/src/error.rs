//! Typed errors for provider discovery and table generation.
//!
//! Problems with individual providers or source files are not errors: they
//! become [`Diagnostic`](crate::Diagnostic)s and discovery continues. The
//! variants here abort the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogvalError {
    /// I/O error when reading sources or writing the artifact
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Syntax error in a Rust source file
    #[error("Parse error in {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        /// 1-indexed
        line: Option<usize>,
        column: Option<usize>,
    },

    /// Invalid logval.toml
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Generated source could not be produced
    #[error("Synthesis error: {message}")]
    Synthesis { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl LogvalError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Parse error at the position reported by `syn`.
    pub fn from_syn(path: impl Into<PathBuf>, err: &syn::Error) -> Self {
        let start = err.span().start();
        Self::Parse {
            path: path.into(),
            message: err.to_string(),
            line: Some(start.line),
            column: Some(start.column + 1),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether discovery can skip the offending input and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Parse { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type LogvalResult<T> = Result<T, LogvalError>;

/// Adds path context to `std::io` results.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> LogvalResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> LogvalResult<T> {
        self.map_err(|e| LogvalError::io(path, e))
    }
}
