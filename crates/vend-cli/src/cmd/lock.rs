//! Lock command

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use vend_core::github::{GitHubClient, GitHubResolver};
use vend_core::{Config, Engine, Lockfile, Reporter};

use crate::context::Project;
use crate::ui::ConsoleReporter;

/// Resolve `vend.pkg` and write `vend.lock`.
pub async fn lock(project: &Project, config: &Config, output: &ConsoleReporter) -> Result<()> {
    let lockfile = resolve(project, config, output).await?;
    warn_conflicts(&lockfile, output);
    Ok(())
}

/// Resolve the declared dependencies from scratch and persist the result.
pub async fn resolve(
    project: &Project,
    config: &Config,
    output: &ConsoleReporter,
) -> Result<Lockfile> {
    let pkgfile = project.load_pkgfile()?;
    let start = Instant::now();

    let client = GitHubClient::new(config).context("Failed to create HTTP client")?;
    let engine = Engine::new(Arc::new(GitHubResolver::new(client)), config.jobs)
        .with_reporter(Arc::new(*output));
    let lockfile = engine
        .resolve_all(&pkgfile)
        .await
        .context("Failed to resolve dependencies")?;

    project.save_lockfile(&lockfile)?;
    output.summary(
        lockfile.packages().len(),
        "Locked",
        start.elapsed().as_secs_f64(),
    );
    Ok(lockfile)
}

/// Report names that are locked at more than one commit. All of them are
/// installed side by side.
pub fn warn_conflicts(lockfile: &Lockfile, output: &ConsoleReporter) {
    for (name, commits) in lockfile.conflicts() {
        let commits: Vec<&str> = commits.iter().map(String::as_str).collect();
        output.warning(&format!(
            "{name} is locked at multiple commits: {}",
            commits.join(", ")
        ));
    }
}
