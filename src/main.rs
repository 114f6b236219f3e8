use spin_actions::cli::commands::{CliArgs, Commands};
use spin_actions::cli::handlers::{
    handle_build, handle_deploy, handle_install, handle_preview, handle_push, handle_setup,
};
use spin_actions::util::logging::{init_logging, LoggingConfig};
use spin_actions::VERSION;

use clap::Parser;
use tracing::debug;

fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_flags(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("spin-actions v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Setup(setup_args) => handle_setup(setup_args),
        Commands::Build(manifest_args) => handle_build(manifest_args),
        Commands::Deploy(manifest_args) => handle_deploy(manifest_args),
        Commands::Push(manifest_args) => handle_push(manifest_args),
        Commands::Preview(preview_args) => handle_preview(preview_args),
        Commands::Install(install_args) => handle_install(install_args),
    };

    std::process::exit(exit_code);
}
