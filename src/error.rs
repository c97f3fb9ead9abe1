use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons an untrusted backup path is refused. Display text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Backup path cannot be empty")]
    Empty,
    #[error("Path contains null bytes")]
    NullByte,
    #[error("Path contains invalid characters")]
    InvalidCharacters,
    #[error("Absolute paths not allowed")]
    Absolute,
    #[error("Network paths not allowed")]
    NetworkPath,
    #[error("Path exceeds maximum length ({len} > {max})")]
    TooLong { len: usize, max: usize },
    #[error("Path must be within {}", root.display())]
    OutsideRoot { root: PathBuf },
    #[error("Backup root {} is unavailable: {reason}", root.display())]
    RootUnavailable { root: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("invalid backup path: {0}")]
    Validation(#[from] ValidationError),
    #[error("creating backup directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("writing backup {}: {reason}", path.display())]
    Payload { path: PathBuf, reason: String },
    #[error("listing backups under {}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("deleting old backup {}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid backup pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
