//! Download, unpack and install a tool at a deterministic location

use super::download::{download_file_name, Downloader};
use super::layout::ProvisionerConfig;
use super::scratch::ScratchDir;
use super::spec::ToolSpec;
use super::ProvisionError;
use crate::runner::PathRegistrar;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shape of the installed artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// A single executable placed in `<root>/bin/<name>`
    File,
    /// A whole tree placed in `<root>/<name>`, with its `bin/` also on the path
    Directory,
}

/// Installs tools for the remainder of the job.
///
/// Each call stages its work in a fresh scratch directory which is removed on
/// every exit path. Installs are idempotent per destination: when the
/// destination already exists the freshly downloaded artifact is discarded.
/// Concurrent installs of the same tool name from separate processes are not
/// serialized.
pub struct ToolProvisioner<'a> {
    config: ProvisionerConfig,
    downloader: &'a dyn Downloader,
    registrar: &'a dyn PathRegistrar,
}

impl<'a> ToolProvisioner<'a> {
    pub fn new(
        config: ProvisionerConfig,
        downloader: &'a dyn Downloader,
        registrar: &'a dyn PathRegistrar,
    ) -> Self {
        Self {
            config,
            downloader,
            registrar,
        }
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Installs a single executable and returns its installed path
    pub fn install(&self, spec: &ToolSpec) -> Result<PathBuf, ProvisionError> {
        self.provision(spec, InstallMode::File)
    }

    /// Installs a directory tree and returns its installed path
    pub fn install_as_directory(&self, spec: &ToolSpec) -> Result<PathBuf, ProvisionError> {
        self.provision(spec, InstallMode::Directory)
    }

    pub fn provision(&self, spec: &ToolSpec, mode: InstallMode) -> Result<PathBuf, ProvisionError> {
        spec.validate()?;

        info!(tool = %spec.name, url = %spec.source_url, "Downloading tool");
        let scratch = ScratchDir::create(&self.config.scratch_root)?;

        let download = scratch.path().join(download_file_name(&spec.source_url));
        self.downloader.download(&spec.source_url, &download)?;

        let kind = spec.archive_type();
        let extracted = kind.extract(&download, &scratch.path().join("extracted"))?;
        let artifact = if kind.is_archive() {
            extracted.join(&spec.path_in_archive)
        } else {
            extracted
        };

        if !artifact.exists() {
            return Err(ProvisionError::filesystem(
                &artifact,
                io::Error::new(io::ErrorKind::NotFound, "artifact not found after download"),
            ));
        }

        match mode {
            InstallMode::File => self.place_file(spec, &artifact),
            InstallMode::Directory => self.place_directory(spec, &artifact),
        }
        // `scratch` is dropped here, on success and on every `?` above.
    }

    fn place_file(&self, spec: &ToolSpec, artifact: &Path) -> Result<PathBuf, ProvisionError> {
        let tool_dir = self.config.bin_dir();
        fs::create_dir_all(&tool_dir).map_err(|e| ProvisionError::filesystem(&tool_dir, e))?;

        let dest = tool_dir.join(&spec.name);
        info!("copying {} to {}", artifact.display(), dest.display());
        move_if_absent(artifact, &dest)?;

        if !self.config.platform.is_windows() {
            make_executable(&dest)?;
        }

        self.register(&tool_dir)?;
        Ok(dest)
    }

    fn place_directory(&self, spec: &ToolSpec, artifact: &Path) -> Result<PathBuf, ProvisionError> {
        let tool_dir = &self.config.install_root;
        fs::create_dir_all(tool_dir).map_err(|e| ProvisionError::filesystem(tool_dir, e))?;

        let dest = tool_dir.join(&spec.name);
        info!("copying to {}", dest.display());
        move_if_absent(artifact, &dest)?;

        self.register(&dest)?;
        self.register(&dest.join("bin"))?;
        Ok(dest)
    }

    fn register(&self, dir: &Path) -> Result<(), ProvisionError> {
        debug!("Adding {} to path", dir.display());
        self.registrar
            .add_path(dir)
            .map_err(|e| ProvisionError::filesystem(dir, e))
    }
}

/// First install wins: an existing destination is left untouched.
fn move_if_absent(src: &Path, dest: &Path) -> Result<(), ProvisionError> {
    if dest.exists() {
        info!("{} already exists, skipping", dest.display());
        return Ok(());
    }

    move_path(src, dest).map_err(|e| ProvisionError::filesystem(dest, e))
}

/// Rename, falling back to a staged copy when crossing filesystems
fn move_path(src: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }

    copy_into_place(src, dest)?;
    if let Err(e) = remove_path(src) {
        debug!("Failed to remove {}: {}", src.display(), e);
    }
    Ok(())
}

/// Copies `src` into a uniquely named sibling of `dest` and renames the
/// sibling into place, so `dest` never holds a partial copy.
fn copy_into_place(src: &Path, dest: &Path) -> io::Result<()> {
    let staging = staging_path(dest);
    debug!("Staging copy of {} at {}", src.display(), staging.display());

    let result = copy_tree(src, &staging).and_then(|()| fs::rename(&staging, dest));
    if result.is_err() {
        match remove_path(&staging) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!("Failed to remove {}: {}", staging.display(), e)
            }
            _ => {}
        }
    }
    result
}

fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.partial", name, Uuid::new_v4()))
}

/// Recursive copy that keeps symlinks as symlinks
fn copy_tree(src: &Path, dest: &Path) -> io::Result<()> {
    let file_type = fs::symlink_metadata(src)?.file_type();

    if file_type.is_symlink() {
        copy_symlink(src, dest)
    } else if file_type.is_dir() {
        fs::create_dir(dest)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_tree(&entry.path(), &dest.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(src, dest).map(|_| ())
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    copy_tree(&fs::canonicalize(src)?, dest)
}

fn remove_path(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| ProvisionError::filesystem(path, e))?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms).map_err(|e| ProvisionError::filesystem(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_path_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a");
        let dest = dir.path().join("b");
        fs::write(&src, b"payload").unwrap();

        move_path(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_copy_tree_is_recursive() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("bin")).unwrap();
        fs::write(src.join("bin/tool"), b"x").unwrap();
        fs::write(src.join("README"), b"y").unwrap();

        let dest = dir.path().join("dest");
        copy_tree(&src, &dest).unwrap();
        assert_eq!(fs::read(dest.join("bin/tool")).unwrap(), b"x");
        assert_eq!(fs::read(dest.join("README")).unwrap(), b"y");
    }

    fn entry_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_into_place_recreates_directory_symlinks() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("sdk");
        fs::create_dir_all(src.join("bin")).unwrap();
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("bin/clang-17"), b"clang").unwrap();
        std::os::unix::fs::symlink("../bin", src.join("lib/current")).unwrap();

        let root = dir.path().join("install");
        fs::create_dir_all(&root).unwrap();
        let dest = root.join("sdk");
        copy_into_place(&src, &dest).unwrap();

        assert_eq!(
            fs::read_link(dest.join("lib/current")).unwrap(),
            PathBuf::from("../bin")
        );
        assert_eq!(fs::read(dest.join("lib/current/clang-17")).unwrap(), b"clang");
        assert_eq!(entry_names(&root), vec!["sdk"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_destination_absent() {
        use std::os::unix::net::UnixListener;

        let dir = TempDir::new().unwrap();
        let src = dir.path().join("sdk");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("clang-17"), b"clang").unwrap();
        let socket = src.join("daemon.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let root = dir.path().join("install");
        fs::create_dir_all(&root).unwrap();
        let dest = root.join("sdk");

        assert!(copy_into_place(&src, &dest).is_err());
        assert!(!dest.exists());
        assert!(entry_names(&root).is_empty());

        drop(listener);
        fs::remove_file(&socket).unwrap();
        move_if_absent(&src, &dest).unwrap();
        assert_eq!(fs::read(dest.join("clang-17")).unwrap(), b"clang");
    }

    #[test]
    fn test_copy_into_place_single_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("download");
        let dest = dir.path().join("tool");
        fs::write(&src, b"payload").unwrap();

        copy_into_place(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
        assert_eq!(entry_names(dir.path()), vec!["download", "tool"]);
    }

    #[test]
    fn test_move_if_absent_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("new");
        let dest = dir.path().join("existing");
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        move_if_absent(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"old");
        assert!(src.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tool");
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        make_executable(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
