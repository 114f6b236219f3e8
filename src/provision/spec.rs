//! Tool descriptions

use super::ProvisionError;
use crate::archive::ArchiveType;

/// What to download and what to call it once installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Executable (or directory) name at the install destination
    pub name: String,
    /// Where the release artifact is fetched from
    pub source_url: String,
    /// Location of the artifact inside the archive; only needed for archives
    pub path_in_archive: String,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        source_url: impl Into<String>,
        path_in_archive: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            path_in_archive: path_in_archive.into(),
        }
    }

    pub fn archive_type(&self) -> ArchiveType {
        ArchiveType::classify(&self.source_url)
    }

    /// Checks the tool spec before any I/O happens.
    ///
    /// # Errors
    ///
    /// `ProvisionError::Validation` when the name is empty, or when the URL
    /// points to an archive and `path_in_archive` is empty.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.name.is_empty() {
            return Err(ProvisionError::Validation("name required".to_string()));
        }

        if self.archive_type().is_archive() && self.path_in_archive.is_empty() {
            return Err(ProvisionError::Validation("pathInArchive required".to_string()));
        }

        Ok(())
    }
}

/// Free-function form of [`ToolSpec::validate`]
pub fn validate(spec: &ToolSpec) -> Result<(), ProvisionError> {
    spec.validate()
}
