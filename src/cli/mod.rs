pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, Commands, InstallArgs, ManifestArgs, PreviewArgs, SetupArgs};
