//! Error types for cache-pack
//!
//! All modules use `PackResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache-pack operations
pub type PackResult<T> = Result<T, PackError>;

/// Broad failure categories, used for exit codes and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad pack format override or configuration file
    Configuration,
    /// A variable the stage depends on is absent
    MissingRequiredState,
    /// The pack file is not where it should be
    ArtifactMissing,
    /// The archive tool could not be spawned or exited non-zero
    ExternalToolFailure,
    /// No stage argument, or an unrecognized one
    Usage,
    /// Filesystem failure outside the archive tool
    Io,
}

/// All errors that can occur in cache-pack
#[derive(Error, Debug)]
pub enum PackError {
    // Configuration errors
    #[error("Unknown pack format '{id}'. Set CACHE_PACK_FORMAT to one of: {known} (or unset it)")]
    UnknownFormat { id: String, known: String },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // State errors
    #[error("Missing required variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    // Artifact errors
    #[error("Attempting to restore, but cannot find pack file: {0}")]
    RestoredPackFileMissing(PathBuf),

    #[error("Pack file not found after packing: {0}")]
    PackFileNotCreated(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with {}: {command}", exit_status(.code))]
    CommandExit { command: String, code: Option<i32> },

    // Usage errors
    #[error("Missing stage. Usage: cache-pack <init|pre-restore|post-restore|pre-save>")]
    MissingStage,

    #[error("Unknown stage '{0}'. Usage: cache-pack <init|pre-restore|post-restore|pre-save>")]
    UnknownStage(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl PackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFormat { .. } | Self::ConfigInvalid { .. } | Self::ConfigNotFound(_) => {
                ErrorKind::Configuration
            }
            Self::MissingVariables(_) => ErrorKind::MissingRequiredState,
            Self::RestoredPackFileMissing(_) | Self::PackFileNotCreated(_) => {
                ErrorKind::ArtifactMissing
            }
            Self::CommandFailed { .. } | Self::CommandExit { .. } => {
                ErrorKind::ExternalToolFailure
            }
            Self::MissingStage | Self::UnknownStage(_) => ErrorKind::Usage,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether this is a usage error (bad or missing stage argument)
    pub fn is_usage(&self) -> bool {
        self.kind() == ErrorKind::Usage
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RestoredPackFileMissing(_) => Some(
                "The cache entry does not contain a pack file for this format. \
                 Change the cache key if the pack format or tool changed.",
            ),
            Self::PackFileNotCreated(_) => {
                Some("The archive tool exited successfully but wrote nothing. Check its output above.")
            }
            Self::MissingVariables(_) => {
                Some("Run the pre-restore stage first, and make sure the cache task sets CACHE_PATH.")
            }
            Self::CommandFailed { .. } => Some("Is the archive tool installed and on PATH?"),
            _ => None,
        }
    }
}
