use clap::{Args, Parser, Subcommand};

/// CI helper that installs Spin and deploys apps to Fermyon Cloud
#[derive(Parser, Debug)]
#[command(
    name = "spin-actions",
    about = "CI helper that installs Spin and deploys apps to Fermyon Cloud",
    version,
    author,
    long_about = "spin-actions runs as a CI step. It reads step inputs from INPUT_* \
                  environment variables, installs the Spin CLI and plugins, builds and \
                  deploys apps, and reports outputs back to the runner."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Install Spin and plugins",
        long_about = "Downloads the requested Spin release (latest by default), installs it \
                      on the agent and adds it to PATH, then installs plugins in order.\n\n\
                      Examples:\n  \
                      spin-actions setup\n  \
                      spin-actions setup --version v2.0.0 --plugins js2wasm,py2wasm"
    )]
    Setup(SetupArgs),

    #[command(about = "Build the app")]
    Build(ManifestArgs),

    #[command(
        about = "Deploy the app to Fermyon Cloud",
        long_about = "Builds (unless run_build is false), logs in to Fermyon Cloud with \
                      fermyon_token and deploys the app, setting the app-url output."
    )]
    Deploy(ManifestArgs),

    #[command(about = "Build the app and push it to an OCI registry")]
    Push(ManifestArgs),

    #[command(
        about = "Deploy or remove a pull request preview",
        long_about = "Deploys the app as <name>-pr-<number> and comments the URL on the pull \
                      request. With --undeploy the preview app is deleted instead."
    )]
    Preview(PreviewArgs),

    #[command(
        about = "Install an arbitrary tool from a URL",
        long_about = "Downloads a binary or archive and installs it under the per-user tool \
                      directory.\n\n\
                      Examples:\n  \
                      spin-actions install --name jq --url https://example.com/jq-linux64\n  \
                      spin-actions install --name tinygo --url https://example.com/tinygo.tar.gz \
                      --path-in-archive tinygo --dir"
    )]
    Install(InstallArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ManifestArgs {
    #[arg(
        short = 'f',
        long,
        value_name = "FILE",
        help = "App manifest (overrides the manifest_file input)"
    )]
    pub manifest_file: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetupArgs {
    #[arg(long, value_name = "VERSION", help = "Spin version to install, or 'latest'")]
    pub version: Option<String>,

    #[arg(long, value_name = "LIST", help = "Comma-separated plugins to install")]
    pub plugins: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    #[arg(long, help = "Remove the preview instead of deploying it")]
    pub undeploy: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    #[arg(long, help = "Executable or directory name at the destination")]
    pub name: Option<String>,

    #[arg(long, help = "Download URL")]
    pub url: Option<String>,

    #[arg(long, help = "Artifact path inside the archive")]
    pub path_in_archive: Option<String>,

    #[arg(long, help = "Install the artifact as a directory tree")]
    pub dir: bool,
}
