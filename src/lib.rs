//! spin-actions - CI steps for building and deploying Spin apps
//!
//! This library backs a set of CI steps that install the Spin CLI (and its
//! plugins) on a build agent, build and push apps, deploy them to Fermyon
//! Cloud and manage per-pull-request preview deployments.
//!
//! # Core Concepts
//!
//! - **Provisioning**: Download a tool from a URL, unpack it when it is an
//!   archive, place it under a per-user install root and add it to `PATH`
//! - **Deployment log**: `spin deploy` output is scanned for the uploaded
//!   version and the routes the app is reachable at
//! - **Runner protocol**: Step inputs arrive as `INPUT_*` variables; outputs,
//!   exported variables and `PATH` additions go back through runner files
//!
//! # Example Usage
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
//! let spec = ToolSpec::new("jq", "https://example.com/jq-linux-amd64", "");
//! let installed = provisioner.install(&spec)?;
//! println!("installed at {}", installed.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`provision`]: Download, extract and install tools
//! - [`deploy_log`]: Parse `spin deploy` output
//! - [`spin`]: Drive the spin CLI
//! - [`actions`]: The CI steps themselves

pub mod actions;
pub mod archive;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod deploy_log;
pub mod exec;
pub mod github;
pub mod platform;
pub mod provision;
pub mod runner;
pub mod spin;
pub mod util;

pub use archive::ArchiveType;
pub use config::{ActionInputs, ConfigError};
pub use deploy_log::{parse_deployment_log, DeploymentMetadata, Route};
pub use platform::{Arch, Platform};
pub use provision::{ProvisionError, ToolProvisioner, ToolSpec};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
