//! Subcommand handlers
//!
//! Flags override the matching step inputs; everything else comes from the
//! `INPUT_*` environment. Handlers return the process exit code.

use super::commands::{InstallArgs, ManifestArgs, PreviewArgs, SetupArgs};
use crate::actions::{self, ActionContext};
use crate::config::ActionInputs;
use crate::exec::SystemCommandRunner;
use crate::provision::InstallMode;
use crate::runner::ActionsRunner;
use anyhow::Result;
use tracing::error;

fn with_context<T>(inputs: ActionInputs, step: impl FnOnce(&ActionContext<'_>) -> Result<T>) -> i32 {
    let secrets = ["fermyon_token", "registry_password", "github_token"]
        .iter()
        .map(|name| inputs.get_input(name))
        .collect();
    let commands = SystemCommandRunner::with_secrets(secrets);
    let runner = ActionsRunner::from_env();
    let ctx = ActionContext::new(inputs, &commands, &runner);

    match step(&ctx) {
        Ok(_) => 0,
        Err(e) => {
            error!("{:#}", e);
            runner.set_failed(&format!("{:#}", e));
            1
        }
    }
}

fn inputs_with_manifest(args: &ManifestArgs) -> ActionInputs {
    let mut inputs = ActionInputs::from_env();
    if let Some(manifest) = &args.manifest_file {
        inputs.set("manifest_file", manifest);
    }
    inputs
}

pub fn handle_setup(args: &SetupArgs) -> i32 {
    let mut inputs = ActionInputs::from_env();
    if let Some(version) = &args.version {
        inputs.set("version", version);
    }
    if let Some(plugins) = &args.plugins {
        inputs.set("plugins", plugins);
    }
    with_context(inputs, actions::setup)
}

pub fn handle_build(args: &ManifestArgs) -> i32 {
    with_context(inputs_with_manifest(args), actions::build)
}

pub fn handle_deploy(args: &ManifestArgs) -> i32 {
    with_context(inputs_with_manifest(args), actions::deploy)
}

pub fn handle_push(args: &ManifestArgs) -> i32 {
    with_context(inputs_with_manifest(args), actions::push)
}

pub fn handle_preview(args: &PreviewArgs) -> i32 {
    let mut inputs = inputs_with_manifest(&args.manifest);
    if args.undeploy {
        inputs.set("undeploy", "true");
    }
    with_context(inputs, actions::preview)
}

pub fn handle_install(args: &InstallArgs) -> i32 {
    let mut inputs = ActionInputs::from_env();
    for (name, value) in [
        ("name", &args.name),
        ("url", &args.url),
        ("path_in_archive", &args.path_in_archive),
    ] {
        if let Some(value) = value {
            inputs.set(name, value);
        }
    }

    let mode = if args.dir {
        InstallMode::Directory
    } else {
        InstallMode::File
    };
    with_context(inputs, |ctx| actions::install_tool(ctx, mode))
}
