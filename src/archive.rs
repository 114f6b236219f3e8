//! Archive classification and extraction
//!
//! The archive format of a release artifact is derived from the suffix of its
//! download URL. Each format has exactly one extraction strategy; gzip tarballs
//! and zip files are unpacked in-process, xz tarballs and 7-zip archives are
//! handed to the system `tar` and `7z` tools, whose failures surface as
//! [`ProvisionError::ExternalCommand`] with the captured output.

use crate::exec::{args, CommandError, CommandRunner, SystemCommandRunner};
use crate::provision::ProvisionError;
use flate2::read::GzDecoder;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive format of a downloaded artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveType {
    None,
    TarGz,
    TarXz,
    Tgz,
    Zip,
    SevenZ,
}

/// Known suffixes in match priority order
const SUFFIXES: [(&str, ArchiveType); 5] = [
    (".tar.gz", ArchiveType::TarGz),
    (".tar.xz", ArchiveType::TarXz),
    (".tgz", ArchiveType::Tgz),
    (".zip", ArchiveType::Zip),
    (".7z", ArchiveType::SevenZ),
];

impl ArchiveType {
    /// Classifies a download URL by its suffix. Never fails.
    pub fn classify(url: &str) -> Self {
        SUFFIXES
            .iter()
            .find(|(suffix, _)| url.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .unwrap_or(ArchiveType::None)
    }

    pub fn is_archive(&self) -> bool {
        !matches!(self, ArchiveType::None)
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            ArchiveType::None => "",
            ArchiveType::TarGz => ".tar.gz",
            ArchiveType::TarXz => ".tar.xz",
            ArchiveType::Tgz => ".tgz",
            ArchiveType::Zip => ".zip",
            ArchiveType::SevenZ => ".7z",
        }
    }

    /// Extracts `archive` into `dest` and returns the directory holding the
    /// extracted contents.
    ///
    /// For [`ArchiveType::None`] the archive itself is the artifact and its
    /// path is returned untouched.
    pub fn extract(&self, archive: &Path, dest: &Path) -> Result<PathBuf, ProvisionError> {
        if !self.is_archive() {
            return Ok(archive.to_path_buf());
        }

        fs::create_dir_all(dest).map_err(|e| ProvisionError::filesystem(dest, e))?;
        debug!(kind = %self, archive = %archive.display(), dest = %dest.display(), "Extracting");

        let in_process = |output| ProvisionError::Extraction { kind: *self, output };
        match self {
            ArchiveType::None => {}
            ArchiveType::TarGz | ArchiveType::Tgz => {
                extract_tar_gz(archive, dest).map_err(in_process)?
            }
            ArchiveType::Zip => extract_zip(archive, dest).map_err(in_process)?,
            ArchiveType::TarXz => extract_tar_xz(archive, dest)?,
            ArchiveType::SevenZ => extract_7z(archive, dest)?,
        }

        Ok(dest.to_path_buf())
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveType::None => f.write_str("none"),
            other => f.write_str(other.suffix().trim_start_matches('.')),
        }
    }
}

/// Shorthand for [`ArchiveType::classify`]
pub fn classify(url: &str) -> ArchiveType {
    ArchiveType::classify(url)
}

// In-process strategies return the diagnostic text of the failure; the
// system tools report through `CommandError`.

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), String> {
    let file = File::open(archive).map_err(|e| format!("{}: {}", archive.display(), e))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(file));
    tarball.set_preserve_permissions(true);
    tarball
        .unpack(dest)
        .map_err(|e| format!("Failed to unpack {}: {}", archive.display(), e))
}

fn extract_tar_xz(archive: &Path, dest: &Path) -> Result<(), CommandError> {
    let tar_args = args([
        "-xJf".to_string(),
        archive.display().to_string(),
        "-C".to_string(),
        dest.display().to_string(),
    ]);
    SystemCommandRunner::new().run("tar", &tar_args).map(|_| ())
}

fn extract_7z(archive: &Path, dest: &Path) -> Result<(), CommandError> {
    let seven_zip_args = args([
        "x".to_string(),
        archive.display().to_string(),
        format!("-o{}", dest.display()),
        "-y".to_string(),
    ]);
    SystemCommandRunner::new().run("7z", &seven_zip_args).map(|_| ())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), String> {
    let file = File::open(archive).map_err(|e| format!("{}: {}", archive.display(), e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| format!("Failed to open zip: {}", e))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| format!("Failed to read zip entry: {}", e))?;

        let outpath = match entry.enclosed_name() {
            Some(path) => dest.join(path),
            None => continue,
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| io_message(&outpath, e))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| io_message(parent, e))?;
        }
        let mut out = File::create(&outpath).map_err(|e| io_message(&outpath, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| io_message(&outpath, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))
                .map_err(|e| io_message(&outpath, e))?;
        }
    }

    Ok(())
}

fn io_message(path: &Path, err: io::Error) -> String {
    format!("{}: {}", path.display(), err)
}
