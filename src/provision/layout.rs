//! Install locations

use super::ProvisionError;
use crate::platform::{resolve_platform, Platform};
use std::env;
use std::path::{Path, PathBuf};

/// Overrides the computed install root
pub const INSTALL_ROOT_ENV: &str = "SPIN_ACTIONS_INSTALL_ROOT";
/// Overrides the computed scratch root
pub const SCRATCH_ROOT_ENV: &str = "SPIN_ACTIONS_SCRATCH_ROOT";

const INSTALL_DIR_NAME: &str = "downloader";

/// Where tools are staged and where they end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    pub platform: Platform,
    /// Base install directory; directory installs land directly under it
    pub install_root: PathBuf,
    /// Parent of the per-install scratch directories
    pub scratch_root: PathBuf,
}

impl ProvisionerConfig {
    /// Computes the layout for the running host.
    ///
    /// `SPIN_ACTIONS_INSTALL_ROOT` and `SPIN_ACTIONS_SCRATCH_ROOT` take
    /// precedence over the derived locations.
    pub fn from_env() -> Result<Self, ProvisionError> {
        let platform = resolve_platform()?;

        let install_root = match env::var_os(INSTALL_ROOT_ENV) {
            Some(root) => PathBuf::from(root),
            None => {
                let user = current_user().ok_or_else(|| {
                    ProvisionError::Validation("unable to determine the current user".to_string())
                })?;
                let profile = env::var_os("USERPROFILE").map(PathBuf::from);
                install_root_for(platform, &user, profile.as_deref())
            }
        };

        let scratch_root = env::var_os(SCRATCH_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_scratch_root);

        Ok(Self {
            platform,
            install_root,
            scratch_root,
        })
    }

    /// Layout rooted at explicit directories, for callers that manage paths themselves
    pub fn with_roots(platform: Platform, install_root: PathBuf, scratch_root: PathBuf) -> Self {
        Self {
            platform,
            install_root,
            scratch_root,
        }
    }

    /// Destination directory for single-file installs
    pub fn bin_dir(&self) -> PathBuf {
        self.install_root.join("bin")
    }
}

/// Deterministic install root for a platform and user.
///
/// Windows installs go under `%USERPROFILE%` (or `C:\` when unset), macOS
/// under `/Users`, everything else under `/home`.
pub fn install_root_for(platform: Platform, user: &str, user_profile: Option<&Path>) -> PathBuf {
    let base = match platform {
        Platform::Windows => user_profile
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("C:\\")),
        Platform::MacOs => PathBuf::from("/Users"),
        Platform::Linux | Platform::FreeBsd | Platform::OpenBsd => PathBuf::from("/home"),
    };

    base.join(user).join(INSTALL_DIR_NAME)
}

pub fn default_scratch_root() -> PathBuf {
    env::temp_dir().join("tmp").join("runner")
}

/// Login name of the current user.
///
/// The basename of the home directory wins; `USER` and `USERNAME` are only
/// consulted when no home directory is known. On unix `dirs::home_dir`
/// reads `$HOME` first, so an overridden `HOME` changes the result.
pub fn current_user() -> Option<String> {
    let env_user = env::var("USER").or_else(|_| env::var("USERNAME")).ok();
    resolve_user(dirs::home_dir().as_deref(), env_user)
}

fn resolve_user(home: Option<&Path>, env_user: Option<String>) -> Option<String> {
    home.and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .or_else(|| env_user.filter(|u| !u.is_empty()))
}
