//! Driver for the `spin` command-line tool

use crate::deploy_log::{parse_deployment_log, DeploymentMetadata};
use crate::exec::{args, CommandError, CommandRunner};
use crate::platform::{Arch, Platform};
use crate::provision::{ToolProvisioner, ToolSpec};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const SPIN: &str = "spin";
const RELEASES_URL: &str = "https://github.com/fermyon/spin/releases/download";

/// Release artifact URL for a Spin version on a platform
pub fn download_url(version: &str, platform: Platform, arch: Arch) -> String {
    let extension = if platform.is_windows() { ".zip" } else { ".tar.gz" };
    format!(
        "{RELEASES_URL}/{version}/spin-{version}-{platform}-{arch}{extension}",
    )
}

/// Name of the spin executable on a platform
pub fn binary_name(platform: Platform) -> &'static str {
    if platform.is_windows() {
        "spin.exe"
    } else {
        SPIN
    }
}

/// Subset of a Spin application manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    pub name: String,
}

impl AppManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read app manifest {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("Invalid app manifest {}", path.display()))
    }

    /// Reads the app name from a v1 (`name`) or v2 (`[application].name`) manifest
    pub fn parse(data: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(data).context("Failed to parse TOML")?;

        let name = value
            .get("name")
            .or_else(|| value.get("application").and_then(|app| app.get("name")))
            .and_then(|name| name.as_str())
            .context("manifest has no application name")?;

        Ok(Self {
            name: name.to_string(),
        })
    }
}

/// Runs spin subcommands through a [`CommandRunner`]
pub struct SpinCli<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SpinCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn spin<I, S>(&self, arguments: I) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run(SPIN, &args(arguments)).map(|out| out.stdout)
    }

    /// Provisions Spin and checks that the installed binary reports `version`.
    ///
    /// Returns the output of `spin --version`.
    pub fn install(
        &self,
        version: &str,
        platform: Platform,
        arch: Arch,
        provisioner: &ToolProvisioner<'_>,
    ) -> Result<String> {
        let binary = binary_name(platform);
        let spec = ToolSpec::new(binary, download_url(version, platform, arch), binary);
        provisioner
            .install(&spec)
            .with_context(|| format!("Failed to install spin {}", version))?;

        let result = self.runner.output(SPIN, &args(["--version"]))?;
        if !result.success() {
            bail!(
                "failed while verifying spin version.\n[stdout: {}] [stderr: {}]",
                result.stdout,
                result.stderr
            );
        }

        let expected = version.strip_prefix('v').unwrap_or(version);
        if !result.stdout.contains(expected) {
            bail!("expected version {}, found {}", version, result.stdout);
        }

        Ok(result.stdout.trim().to_string())
    }

    /// Installs plugins one after another, stopping at the first failure
    pub fn install_plugins(&self, plugins: &[String]) -> Result<()> {
        self.spin(["plugin", "update"])
            .context("Failed to update plugin manifests")?;

        for plugin in plugins {
            self.install_plugin(plugin)
                .with_context(|| format!("Failed to install spin plugin '{}'", plugin))?;
        }
        Ok(())
    }

    fn install_plugin(&self, plugin: &str) -> Result<()> {
        info!("installing spin plugin '{}'", plugin);
        self.spin(["plugin", "install", plugin, "--yes"])?;

        let result = self.runner.output(SPIN, &args([plugin, "--version"]))?;
        if !result.success() {
            bail!(
                "failed while verifying installation for spin plugin {}.\n[stdout: {}] [stderr: {}]",
                plugin,
                result.stdout,
                result.stderr
            );
        }
        Ok(())
    }

    pub fn build(&self, manifest: &str) -> Result<()> {
        self.spin(["build", "-f", manifest])?;
        Ok(())
    }

    /// Runs an arbitrary build command line through the platform shell
    pub fn build_cmd(&self, cmd: &str) -> Result<()> {
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        self.runner.run(shell, &args([flag, cmd]))?;
        Ok(())
    }

    pub fn registry_login(&self, registry: &str, username: &str, password: &str) -> Result<()> {
        self.spin([
            "registry",
            "login",
            "--username",
            username,
            "--password",
            password,
            registry,
        ])?;
        Ok(())
    }

    pub fn registry_push(&self, reference: &str, manifest: &str) -> Result<()> {
        self.spin(["registry", "push", "-f", manifest, reference])?;
        Ok(())
    }

    pub fn cloud_login(&self, token: &str, cloud_url: &str) -> Result<()> {
        self.spin(["cloud", "login", "--token", token, "--url", cloud_url])
            .context("Failed to log in to Fermyon Cloud")?;
        Ok(())
    }

    /// Deploys the app described by `manifest` and parses what the deploy reported
    pub fn deploy(
        &self,
        manifest: &str,
        key_values: &[String],
        variables: &[String],
    ) -> Result<DeploymentMetadata> {
        let app = AppManifest::from_file(Path::new(manifest))?;

        let mut deploy_args = args(["deploy", "-f", manifest]);
        for kv in key_values {
            deploy_args.push("--key-value".to_string());
            deploy_args.push(kv.clone());
        }
        for variable in variables {
            deploy_args.push("--variable".to_string());
            deploy_args.push(variable.clone());
        }

        let output = self.runner.output(SPIN, &deploy_args)?;
        if !output.success() {
            return Err(CommandError::failed("deploy", output).into());
        }

        Ok(parse_deployment_log(&app.name, &output.stdout))
    }

    /// Deploys the app under a different name using a renamed copy of the manifest
    pub fn deploy_as(
        &self,
        app_name: &str,
        manifest: &str,
        key_values: &[String],
        variables: &[String],
    ) -> Result<DeploymentMetadata> {
        let renamed = write_renamed_manifest(Path::new(manifest), app_name)?;
        let renamed = renamed.to_string_lossy().into_owned();
        self.deploy(&renamed, key_values, variables)
    }
}

/// Writes `<app_name>-spin.toml` beside `manifest` with the app renamed
pub fn write_renamed_manifest(manifest: &Path, app_name: &str) -> Result<PathBuf> {
    let original = AppManifest::from_file(manifest)?;
    let data = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read app manifest {}", manifest.display()))?;

    let renamed = data.replace(
        &format!("name = \"{}\"", original.name),
        &format!("name = \"{}\"", app_name),
    );

    let dir = manifest.parent().unwrap_or_else(|| Path::new(""));
    let target = dir.join(format!("{}-spin.toml", app_name));
    fs::write(&target, renamed)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_download_url() {
        assert_eq!(
            download_url("v2.0.0", Platform::Linux, Arch::Amd64),
            "https://github.com/fermyon/spin/releases/download/v2.0.0/spin-v2.0.0-linux-amd64.tar.gz"
        );
        assert_eq!(
            download_url("v2.0.0", Platform::Windows, Arch::Amd64),
            "https://github.com/fermyon/spin/releases/download/v2.0.0/spin-v2.0.0-windows-amd64.zip"
        );
        assert_eq!(
            download_url("v1.5.1", Platform::MacOs, Arch::Aarch64),
            "https://github.com/fermyon/spin/releases/download/v1.5.1/spin-v1.5.1-macos-aarch64.tar.gz"
        );
    }

    #[test]
    fn test_binary_name() {
        assert_eq!(binary_name(Platform::Windows), "spin.exe");
        assert_eq!(binary_name(Platform::Linux), "spin");
    }

    #[test]
    fn test_manifest_v1() {
        let manifest = AppManifest::parse(
            "spin_manifest_version = \"1\"\nname = \"hello\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        assert_eq!(manifest.name, "hello");
    }

    #[test]
    fn test_manifest_v2() {
        let manifest = AppManifest::parse(
            "spin_manifest_version = 2\n\n[application]\nname = \"hello-v2\"\n\n[[trigger.http]]\nroute = \"/...\"\ncomponent = \"hello\"\n",
        )
        .unwrap();
        assert_eq!(manifest.name, "hello-v2");
    }

    #[test]
    fn test_manifest_without_name() {
        assert!(AppManifest::parse("spin_manifest_version = 2\n").is_err());
        assert!(AppManifest::parse("not toml [").is_err());
    }

    #[test]
    fn test_write_renamed_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("spin.toml");
        fs::write(
            &manifest,
            "[application]\nname = \"hello\"\n\n[component.hello]\nsource = \"hello.wasm\"\n",
        )
        .unwrap();

        let renamed = write_renamed_manifest(&manifest, "hello-pr-7").unwrap();
        assert_eq!(renamed, dir.path().join("hello-pr-7-spin.toml"));
        assert_eq!(
            AppManifest::from_file(&renamed).unwrap().name,
            "hello-pr-7"
        );
        assert_eq!(AppManifest::from_file(&manifest).unwrap().name, "hello");
    }
}
