//! Tool provisioning
//!
//! Downloads a versioned command-line tool, unpacks it with the strategy its
//! archive format needs, installs it at a deterministic per-user location and
//! puts it on the lookup path for the rest of the job.
//!
//! ```no_run
//! use spin_actions::provision::{HttpDownloader, ProvisionerConfig, ToolProvisioner, ToolSpec};
//! use spin_actions::runner::ActionsRunner;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = HttpDownloader::new()?;
//! let runner = ActionsRunner::from_env();
//! let provisioner = ToolProvisioner::new(ProvisionerConfig::from_env()?, &downloader, &runner);
//!
//! let spec = ToolSpec::new(
//!     "spin",
//!     "https://github.com/fermyon/spin/releases/download/v2.0.0/spin-v2.0.0-linux-amd64.tar.gz",
//!     "spin",
//! );
//! provisioner.install(&spec)?;
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod error;
pub mod layout;
pub mod provisioner;
pub mod scratch;
pub mod spec;

pub use download::{Downloader, HttpDownloader};
pub use error::ProvisionError;
pub use layout::{install_root_for, ProvisionerConfig};
pub use provisioner::{InstallMode, ToolProvisioner};
pub use scratch::ScratchDir;
pub use spec::{validate, ToolSpec};
