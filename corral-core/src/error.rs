//! Error types for corral

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to parse a line of kernel stat output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line did not split into the expected number of fields
    #[error("expected {expected} field(s), found {found} in {line:?}")]
    FieldCount {
        /// Offending line
        line: String,
        /// Number of fields the format requires
        expected: usize,
        /// Number of fields present
        found: usize,
    },

    /// Value is not a plain unsigned decimal integer
    #[error("invalid unsigned value {value:?}")]
    InvalidValue {
        /// Offending value
        value: String,
        /// Underlying integer parse failure, absent for non-decimal input
        #[source]
        source: Option<ParseIntError>,
    },

    /// Line is not valid UTF-8
    #[error("line is not valid UTF-8: {line:?}")]
    NotUtf8 {
        /// Offending line, with invalid sequences replaced
        line: String,
    },
}

/// corral error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Controller directory could not be created
    #[error("failed to create directory `{}`: {source}", path.display())]
    DirectoryCreate {
        /// Directory being created
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Tunable file could not be opened or written
    #[error("failed to write `{}`: {source}", path.display())]
    FileWrite {
        /// Tunable file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stat file is missing or inaccessible
    #[error("failed to open `{}`: {source}", path.display())]
    FileOpen {
        /// Stat file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stat file could be opened but reading it failed
    #[error("failed to read `{}`: {source}", path.display())]
    FileRead {
        /// Stat file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stat file contents are malformed
    #[error("failed to parse `{}`: {source}", path.display())]
    Parse {
        /// Stat file
        path: PathBuf,
        /// Underlying parse failure
        #[source]
        source: ParseError,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// A controller with this name is already registered
    #[error("controller `{name}` is already registered")]
    DuplicateController {
        /// Controller name
        name: String,
    },

    /// System error from nix
    #[error("System error: {0}")]
    System(#[from] nix::Error),

    /// Channel send error
    #[error("Channel send error")]
    ChannelSend,

    /// Task join error
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl Error {
    /// Whether this error stems from a missing file or directory
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::DirectoryCreate { source, .. }
            | Self::FileWrite { source, .. }
            | Self::FileOpen { source, .. }
            | Self::FileRead { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::ChannelSend
    }
}

/// Result type alias for corral operations
pub type Result<T> = std::result::Result<T, Error>;
