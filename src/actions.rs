//! Workflow entry points
//!
//! Each public function here is one CI step: it reads its inputs, drives the
//! spin CLI and the cloud/GitHub clients, and reports outputs back to the
//! runner. Clients are constructed per call and passed down explicitly.

use crate::cloud::CloudClient;
use crate::config::{ActionInputs, ConfigError, GITHUB_API_URL};
use crate::exec::CommandRunner;
use crate::github::GithubClient;
use crate::platform::{resolve_arch, resolve_platform};
use crate::provision::{HttpDownloader, InstallMode, ProvisionerConfig, ToolProvisioner, ToolSpec};
use crate::runner::ActionsRunner;
use crate::spin::{AppManifest, SpinCli};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SPIN_GITHUB_ORG: &str = "fermyon";
const SPIN_GITHUB_REPO: &str = "spin";
const APP_URL_OUTPUT: &str = "app-url";
const REGISTRY_INPUTS: [&str; 3] = ["registry", "registry_username", "registry_password"];

/// Everything a step needs from its environment
pub struct ActionContext<'a> {
    pub inputs: ActionInputs,
    pub commands: &'a dyn CommandRunner,
    pub runner: &'a ActionsRunner,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        inputs: ActionInputs,
        commands: &'a dyn CommandRunner,
        runner: &'a ActionsRunner,
    ) -> Self {
        Self {
            inputs,
            commands,
            runner,
        }
    }

    fn spin(&self) -> SpinCli<'_> {
        SpinCli::new(self.commands)
    }

    fn cloud_client(&self) -> Result<CloudClient> {
        let token = self.inputs.get_required_input("fermyon_token")?;
        Ok(CloudClient::new(&self.inputs.cloud_url(), &token)?)
    }

    fn github_client(&self) -> Result<GithubClient> {
        Ok(GithubClient::new(GITHUB_API_URL, self.inputs.github_token())?)
    }
}

/// Installs Spin (and requested plugins) on the agent
pub fn setup(ctx: &ActionContext<'_>) -> Result<()> {
    let mut version = ctx.inputs.version();
    if version == "latest" {
        version = ctx
            .github_client()?
            .latest_release(SPIN_GITHUB_ORG, SPIN_GITHUB_REPO)?;
        info!("Resolved latest spin release to {}", version);
    }

    let platform = resolve_platform()?;
    let arch = resolve_arch()?;
    let downloader = HttpDownloader::new()?;
    let provisioner = ToolProvisioner::new(ProvisionerConfig::from_env()?, &downloader, ctx.runner);

    let installed = ctx.spin().install(&version, platform, arch, &provisioner)?;
    ctx.runner
        .export_variable("SPIN_VERSION", &installed)
        .context("Failed to export SPIN_VERSION")?;

    let plugins = ctx.inputs.plugins();
    if !plugins.is_empty() {
        ctx.spin().install_plugins(&plugins)?;
    }

    Ok(())
}

/// Builds the app, via `build_cmd` when given, else `spin build`
pub fn build(ctx: &ActionContext<'_>) -> Result<()> {
    let build_cmd = ctx.inputs.get_input("build_cmd");
    if !build_cmd.is_empty() {
        return ctx.spin().build_cmd(&build_cmd);
    }
    ctx.spin().build(&ctx.inputs.manifest_file())
}

/// Deploys the app to the cloud and returns its URL
pub fn deploy(ctx: &ActionContext<'_>) -> Result<String> {
    if ctx.inputs.get_boolean_input("run_build", true)? {
        build(ctx)?;
    }

    let token = ctx.inputs.get_required_input("fermyon_token")?;
    let cloud_url = ctx.inputs.cloud_url();
    ctx.spin().cloud_login(&token, &cloud_url)?;

    let manifest = ctx.inputs.manifest_file();
    let metadata = ctx
        .spin()
        .deploy(&manifest, &ctx.inputs.key_values(), &ctx.inputs.variables())?;
    debug!(version = %metadata.version, routes = metadata.routes.len(), "Deployment log parsed");

    let app_url = if metadata.has_routes() {
        metadata.base_url.clone()
    } else {
        ctx.cloud_client()?.get_app_by_name(&metadata.app_name)?.url()
    };

    ctx.runner.set_output(APP_URL_OUTPUT, &app_url)?;
    info!("your app is deployed and available at {}", app_url);
    Ok(app_url)
}

/// Logs in to an OCI registry when all registry inputs are given
pub fn registry_login(ctx: &ActionContext<'_>) -> Result<()> {
    let values: Vec<String> = REGISTRY_INPUTS
        .iter()
        .map(|name| ctx.inputs.get_input(name))
        .collect();
    let provided = values.iter().filter(|v| !v.is_empty()).count();

    if provided == 0 {
        debug!("registry login not requested");
        return Ok(());
    }
    if provided != REGISTRY_INPUTS.len() {
        return Err(ConfigError::PartialGroup(REGISTRY_INPUTS.join(",")).into());
    }

    ctx.spin().registry_login(&values[0], &values[1], &values[2])
}

/// Builds the app and pushes it to an OCI registry
pub fn push(ctx: &ActionContext<'_>) -> Result<()> {
    build(ctx)?;
    registry_login(ctx)?;

    let reference = ctx.inputs.get_required_input("registry_reference")?;
    ctx.spin()
        .registry_push(&reference, &ctx.inputs.manifest_file())
}

/// Deploys or removes the per-pull-request preview app
pub fn preview(ctx: &ActionContext<'_>) -> Result<Option<String>> {
    let event_path = env::var_os("GITHUB_EVENT_PATH")
        .map(PathBuf::from)
        .context("GITHUB_EVENT_PATH is not set")?;
    let pr = pull_request_number(&event_path)?;

    if ctx.inputs.get_boolean_input("undeploy", false)? {
        undeploy_preview(ctx, pr)?;
        return Ok(None);
    }

    let token = ctx.inputs.get_required_input("fermyon_token")?;
    ctx.spin().cloud_login(&token, &ctx.inputs.cloud_url())?;
    if ctx.inputs.get_boolean_input("run_build", true)? {
        build(ctx)?;
    }

    deploy_preview(ctx, pr).map(Some)
}

pub fn preview_app_name(app_name: &str, pr: u64) -> String {
    format!("{}-pr-{}", app_name, pr)
}

pub fn deploy_preview(ctx: &ActionContext<'_>, pr: u64) -> Result<String> {
    let manifest = ctx.inputs.manifest_file();
    let real_name = AppManifest::from_file(Path::new(&manifest))?.name;
    let preview_name = preview_app_name(&real_name, pr);

    info!("🚀 deploying preview as {} to Fermyon Cloud", preview_name);
    let metadata = ctx.spin().deploy_as(
        &preview_name,
        &manifest,
        &ctx.inputs.key_values(),
        &ctx.inputs.variables(),
    )?;

    let app_url = if metadata.has_routes() {
        metadata.base_url.clone()
    } else {
        ctx.cloud_client()?.get_app_by_name(&preview_name)?.url()
    };

    let comment = format!(
        "🚀 preview deployed successfully to Fermyon Cloud and available at {}",
        app_url
    );
    info!("{}", comment);

    let (owner, repo) = repository_from_env()?;
    ctx.github_client()?
        .update_comment(&owner, &repo, pr, &comment)?;

    ctx.runner.set_output(APP_URL_OUTPUT, &app_url)?;
    Ok(app_url)
}

pub fn undeploy_preview(ctx: &ActionContext<'_>, pr: u64) -> Result<()> {
    let manifest = ctx.inputs.manifest_file();
    let real_name = AppManifest::from_file(Path::new(&manifest))?.name;
    let preview_name = preview_app_name(&real_name, pr);

    let client = ctx.cloud_client()?;
    let existing = client
        .get_all_apps()?
        .into_iter()
        .find(|app| app.name == preview_name);

    let Some(app) = existing else {
        info!("no preview found for pr {}", pr);
        return Ok(());
    };

    info!("cleaning up preview for pr {}", pr);
    client.delete_app_by_id(&app.id)?;
    info!("preview deployment removed successfully");
    Ok(())
}

/// Installs an arbitrary tool described by the `name`, `url` and
/// `path_in_archive` inputs
pub fn install_tool(ctx: &ActionContext<'_>, mode: InstallMode) -> Result<PathBuf> {
    let spec = ToolSpec::new(
        ctx.inputs.get_input("name"),
        ctx.inputs.get_required_input("url")?,
        ctx.inputs.get_input("path_in_archive"),
    );

    let downloader = HttpDownloader::new()?;
    let provisioner = ToolProvisioner::new(ProvisionerConfig::from_env()?, &downloader, ctx.runner);
    let installed = provisioner.provision(&spec, mode)?;
    info!("Installed {} at {}", spec.name, installed.display());
    Ok(installed)
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequest>,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
}

/// Pull request number from the workflow event payload
pub fn pull_request_number(event_path: &Path) -> Result<u64> {
    let data = fs::read_to_string(event_path)
        .with_context(|| format!("Failed to read event payload {}", event_path.display()))?;
    let payload: EventPayload =
        serde_json::from_str(&data).context("Failed to parse event payload")?;

    match payload.pull_request {
        Some(pr) => Ok(pr.number),
        None => bail!("this action currently support deploying apps on PR only"),
    }
}

fn repository_from_env() -> Result<(String, String)> {
    let repository = env::var("GITHUB_REPOSITORY").context("GITHUB_REPOSITORY is not set")?;
    split_repository(&repository)
}

fn split_repository(repository: &str) -> Result<(String, String)> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => bail!("GITHUB_REPOSITORY must be owner/repo, got '{}'", repository),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preview_app_name() {
        assert_eq!(preview_app_name("hello", 42), "hello-pr-42");
    }

    #[test]
    fn test_pull_request_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        fs::write(&path, r#"{"action": "opened", "pull_request": {"number": 17, "title": "x"}}"#)
            .unwrap();
        assert_eq!(pull_request_number(&path).unwrap(), 17);
    }

    #[test]
    fn test_pull_request_number_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        fs::write(&path, r#"{"ref": "refs/heads/main"}"#).unwrap();
        let err = pull_request_number(&path).unwrap_err();
        assert!(err.to_string().contains("PR only"));
    }

    #[test]
    fn test_split_repository() {
        assert_eq!(
            split_repository("fermyon/actions").unwrap(),
            ("fermyon".to_string(), "actions".to_string())
        );
        assert!(split_repository("fermyon").is_err());
        assert!(split_repository("/actions").is_err());
    }
}
