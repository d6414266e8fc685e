//! Install command

use std::sync::Arc;

use anyhow::{Context, Result};

use vend_core::github::{GitHubClient, GitHubInstaller};
use vend_core::{Config, Orchestrator};

use crate::cmd::lock;
use crate::context::Project;
use crate::ui::ConsoleReporter;

/// Install locked dependencies into `vendor/`.
///
/// `vend.lock` is reused when its roots match `vend.pkg` and `update` is
/// not set; otherwise the dependencies are resolved again first. Checksums
/// of the installed trees are written back into `vend.lock`.
pub async fn install(
    project: &Project,
    config: &Config,
    update: bool,
    output: &ConsoleReporter,
) -> Result<()> {
    let pkgfile = project.load_pkgfile()?;

    let current = if update {
        None
    } else {
        project
            .load_lockfile()?
            .filter(|lockfile| lockfile.satisfies(&pkgfile))
    };
    let lockfile = match current {
        Some(lockfile) => {
            tracing::debug!("{} is up to date", project.lockfile_path().display());
            lockfile
        }
        None => lock::resolve(project, config, output).await?,
    };
    lock::warn_conflicts(&lockfile, output);

    let client = GitHubClient::new(config).context("Failed to create HTTP client")?;
    let orchestrator = Orchestrator::new(
        Arc::new(GitHubInstaller::new(client)),
        config.scratch_dir.clone(),
    )
    .with_reporter(Arc::new(*output));

    let vendor = project.vendor_dir();
    let sums = orchestrator
        .install(&lockfile.packages(), &vendor)
        .await
        .with_context(|| format!("Failed to install into {}", vendor.display()))?;

    project.save_lockfile(&lockfile.apply_sums(&sums))
}
