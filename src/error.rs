//! Error taxonomy for the parsing and profile-application core

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the core operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The token stream does not form a literal table.
    #[error("malformed table at token {position}: {message}")]
    MalformedTable { position: usize, message: String },

    /// A directory or file could not be read or written.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An account-scoped operation was called without an account.
    #[error("no account selected")]
    NoAccountSelected,

    /// The install directory is missing a required part.
    #[error("invalid install directory {path}: {reason}")]
    InvalidInstallDirectory { path: PathBuf, reason: String },

    /// The manifest could not be copied before being overwritten.
    #[error("failed to back up {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The new manifest could not be written.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProfileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_install(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInstallDirectory {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;
