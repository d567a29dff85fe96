//! Error handling and types

use std::path::PathBuf;
use thiserror::Error;

/// Copy engine and file operation errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// File copy operation failed
    #[error("Copy operation failed: {0}")]
    CopyFailed(String),

    /// Source entry is not something we copy
    #[error("{} was not copied as it is not a regular file", .0.display())]
    NotRegularFile(PathBuf),

    /// General filesystem error
    #[error("File system error: {0}")]
    FileSystem(String),

    /// The run was stopped through its cancel token
    #[error("Run cancelled")]
    Cancelled,

    /// A runner may only be started once
    #[error("Runner has already been started")]
    AlreadyRun,

    /// Internal application error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Wrap an I/O error with the operation and path it came from
    pub(crate) fn fs(action: &str, path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::FileSystem(format!("Failed to {action} {}: {err}", path.display()))
    }
}

/// Profile file errors, raised before any copying starts
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No config file in any of the search locations
    #[error("Config file not found (searched: {})", display_paths(.searched))]
    NotFound {
        /// Every path that was tried
        searched: Vec<PathBuf>,
    },

    /// The config file exists but could not be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The config file is not valid YAML or has the wrong shape
    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: serde_yaml::Error,
    },

    /// The requested operation has no entry in the config file
    #[error("Operation \"{0}\" is not defined in the config file")]
    MissingProfile(String),

    /// The profile was found but one of its fields is unusable
    #[error("Invalid profile \"{profile}\": {reason}")]
    Invalid {
        /// Operation key of the profile
        profile: String,
        /// What is wrong with it
        reason: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, SyncError>;
