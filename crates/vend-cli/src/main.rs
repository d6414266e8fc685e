//! vend - vendor jsonnet dependencies from GitHub

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use vend_cli::cmd;
use vend_cli::context::Project;
use vend_cli::ui::ConsoleReporter;
use vend_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let project = Project::new(cli.dir);
    let output = ConsoleReporter::new(cli.quiet);

    match cli.command {
        Commands::Init => cmd::init::init(&project, &output),
        Commands::Add { packages } => cmd::add::add(&project, &packages, &output),
        Commands::Lock { remote } => cmd::lock::lock(&project, &remote.config(), &output).await,
        Commands::Install { update, remote } => {
            cmd::install::install(&project, &remote.config(), update, &output).await
        }
    }
}
