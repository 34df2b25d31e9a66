//! Error types for nbtoc.
//!
//! Library crates use [`NbTocError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all nbtoc operations.
#[derive(Debug, thiserror::Error)]
pub enum NbTocError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a Jupyter server.
    #[error("network error: {0}")]
    Network(String),

    /// Notebook or server-info parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested notebook does not exist.
    #[error("notebook not found: {path:?}")]
    NotFound { path: PathBuf },

    /// Data validation error (unsupported nbformat, bad depth, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbTocError>;

impl NbTocError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    ///
    /// `NotFound` I/O errors become [`NbTocError::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NbTocError::config("bad max_depth");
        assert_eq!(err.to_string(), "config error: bad max_depth");

        let err = NbTocError::validation("nbformat 3 not supported");
        assert!(err.to_string().contains("nbformat 3"));
    }

    #[test]
    fn io_not_found_maps_to_not_found() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = NbTocError::io("missing.ipynb", source);
        assert!(matches!(err, NbTocError::NotFound { .. }));

        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = NbTocError::io("locked.ipynb", source);
        assert!(matches!(err, NbTocError::Io { .. }));
    }
}
