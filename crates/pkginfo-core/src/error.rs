//! Error types for scanning, synthesis and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while scanning source roots.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Source root is not a directory.
    #[error("Source root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors that can occur while synthesizing declaration files.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The packages file is not valid UTF-8.
    #[error("Packages file is not valid UTF-8: {path}")]
    InvalidPackagesFile { path: PathBuf },

    /// Output root exists but is not a directory.
    #[error("Output root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The worker pool could not be started.
    #[error("Failed to build worker pool: {message}")]
    WorkerPool { message: String },
}

impl SynthError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised while loading or validating a project configuration.
///
/// These are setup problems and always abort the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A path that must be absolute was relative.
    #[error("{field} must be an absolute path: {path}")]
    RelativePath { field: &'static str, path: PathBuf },

    /// A path that must be a directory points at something else.
    #[error("{field} is not a directory: {path}")]
    NotADirectory { field: &'static str, path: PathBuf },

    /// Some other value was rejected.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create a read error, reporting a missing file as [`ConfigError::NotFound`].
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Read { path, source },
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
