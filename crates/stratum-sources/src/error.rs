//! Error types for stratum-sources

use std::path::PathBuf;

/// Result type for stratum-sources operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while harvesting or applying configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {}{}: {message}", path.display(), line.map(|l| format!(":{l}")).unwrap_or_default())]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
        line: Option<usize>,
    },

    #[error("Unsupported config format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("Malformed command line argument {index} ({argument:?}): {reason}")]
    MalformedArgument {
        index: usize,
        argument: String,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] stratum_core::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(
        path: impl Into<PathBuf>,
        format: impl Into<String>,
        message: impl Into<String>,
        line: Option<usize>,
    ) -> Self {
        Self::ConfigParse {
            path: path.into(),
            format: format.into(),
            message: message.into(),
            line,
        }
    }
}
