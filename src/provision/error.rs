//! Provisioning error types

use crate::archive::ArchiveType;
use crate::exec::CommandError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while provisioning a tool
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The tool description is incomplete
    #[error("Invalid tool spec: {0}")]
    Validation(String),

    /// No release exists for the host operating system
    #[error("Unsupported operating system platform: {0}")]
    UnsupportedPlatform(String),

    /// No release exists for the host CPU architecture
    #[error("Unsupported operating system architecture: {0}")]
    UnsupportedArch(String),

    /// Fetching the artifact failed
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    /// Unpacking the artifact failed; `output` carries the extractor diagnostics
    #[error("Failed to extract {kind} archive: {output}")]
    Extraction { kind: ArchiveType, output: String },

    /// A move, permission change or directory operation failed
    #[error("Filesystem operation failed on {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A helper command exited unsuccessfully
    #[error(transparent)]
    ExternalCommand(#[from] CommandError),
}

impl ProvisionError {
    pub fn filesystem(path: &Path, source: io::Error) -> Self {
        ProvisionError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn download(url: &str, message: impl Into<String>) -> Self {
        ProvisionError::Download {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
