//! Error types for the launcher core.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the launcher.
#[derive(Debug, Error)]
pub enum LaunchpadError {
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Hidden-app validation
    #[error("application path is empty")]
    EmptyPath,

    #[error("application path must end with .app: {0}")]
    InvalidBundleSuffix(String),

    #[error("application path does not exist: {0}")]
    BundleNotFound(String),

    #[error("index {index} is out of range [0, {len})")]
    IndexOutOfRange { index: i64, len: usize },

    // Launching
    #[error("no application with identifier {0}")]
    UnknownApplication(String),

    #[error("failed to launch {target}: {message}")]
    Launch { target: String, message: String },

    #[error("icon error: {0}")]
    Icon(String),
}

impl LaunchpadError {
    pub(crate) fn io(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source),
        }
    }

    /// Whether the error stems from bad user input rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyPath | Self::InvalidBundleSuffix(_) | Self::BundleNotFound(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LaunchpadError>;
