//! Watcher error types

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors reported by `watch()` and, once active, by the delivery context
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watch root does not exist
    #[error("path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// The watch root exists but is not a directory
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The OS refused or could not create the subscription
    #[error("failed to watch {}: {reason}", path.display())]
    SubscriptionFailed { path: PathBuf, reason: String },

    /// The watch root was removed or renamed while active
    #[error("watch root removed: {}", .0.display())]
    RootRemoved(PathBuf),

    /// The backend reported an error while active
    #[error("watcher backend error: {0}")]
    Backend(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl WatchError {
    /// Classify a setup failure from the backend
    pub(crate) fn subscription(path: &Path, err: notify::Error) -> Self {
        match &err.kind {
            notify::ErrorKind::PathNotFound => WatchError::PathNotFound(path.to_path_buf()),
            notify::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                WatchError::PathNotFound(path.to_path_buf())
            }
            _ => WatchError::SubscriptionFailed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }

    /// Whether this error ended an active watch
    pub fn is_terminal(&self) -> bool {
        matches!(self, WatchError::RootRemoved(_) | WatchError::Backend(_))
    }
}
