//! Install orchestration.
//!
//! Takes the flattened artifact set of a lockfile and materializes each
//! artifact once into `<dest>/<name@commit>`. The destination is wiped
//! first, so an install always starts from a clean tree. Artifacts are
//! installed one at a time in `name@commit` order; the first failure stops
//! the run and leaves already-installed artifacts in place.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use vend_schema::Package;

use crate::error::InstallError;
use crate::io::tree;
use crate::reporter::{NullReporter, Reporter};

/// Materializes the repository behind a resolved package.
#[async_trait]
pub trait Installer: Send + Sync {
    /// Place the full repository root of `pkg` at `pkg.commit` into `dest`.
    /// `scratch` is an empty private directory for intermediate files.
    async fn install(&self, pkg: &Package, scratch: &Path, dest: &Path)
    -> Result<(), InstallError>;
}

/// Drives an [`Installer`] over a set of artifacts.
#[derive(Clone)]
pub struct Orchestrator {
    installer: Arc<dyn Installer>,
    scratch_dir: PathBuf,
    reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator whose scratch directories live under `scratch_dir`.
    pub fn new(installer: Arc<dyn Installer>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            installer,
            scratch_dir: scratch_dir.into(),
            reporter: Arc::new(NullReporter),
        }
    }

    /// Report progress to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Install every artifact of `packages` (keyed by `name@commit`, as
    /// produced by `Lockfile::packages`) below `dest`.
    ///
    /// Returns the content checksum of every installed artifact, keyed by
    /// `name@commit`.
    ///
    /// # Errors
    ///
    /// Fails on the first artifact that cannot be installed: unresolved
    /// packages, installer failures, a missing subdirectory, or a checksum
    /// that does not match the one recorded on the package.
    pub async fn install(
        &self,
        packages: &BTreeMap<String, Package>,
        dest: &Path,
    ) -> Result<BTreeMap<String, String>, InstallError> {
        let start = Instant::now();

        if tokio::fs::try_exists(dest).await? {
            tokio::fs::remove_dir_all(dest).await?;
        }
        tokio::fs::create_dir_all(dest).await?;
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let mut sums = BTreeMap::new();
        for (locked, pkg) in packages {
            self.reporter.installing(pkg);
            match self.install_one(locked, pkg, dest).await {
                Ok(sum) => {
                    self.reporter.done(pkg, "installed");
                    sums.insert(locked.clone(), sum);
                }
                Err(e) => {
                    self.reporter.failed(pkg, &e.to_string());
                    return Err(e);
                }
            }
        }

        self.reporter
            .summary(sums.len(), "install", start.elapsed().as_secs_f64());
        Ok(sums)
    }

    async fn install_one(
        &self,
        locked: &str,
        pkg: &Package,
        dest: &Path,
    ) -> Result<String, InstallError> {
        if !pkg.is_resolved() {
            return Err(InstallError::Unresolved {
                package: pkg.to_string(),
            });
        }
        if !Path::new(locked)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(InstallError::InvalidPath {
                package: pkg.to_string(),
                path: locked.to_string(),
            });
        }

        // Removed on drop, whichever way this function exits.
        let scratch = tempfile::Builder::new()
            .prefix("vend-")
            .tempdir_in(&self.scratch_dir)?;
        let work = scratch.path().join("work");
        let repo_root = scratch.path().join("repo");
        tokio::fs::create_dir_all(&work).await?;

        tracing::debug!("Materializing {locked} in {}", scratch.path().display());
        self.installer.install(pkg, &work, &repo_root).await?;

        let source = repo_root.join(pkg.subdir.trim_start_matches('/'));
        if !tokio::fs::metadata(&source)
            .await
            .is_ok_and(|m| m.is_dir())
        {
            return Err(InstallError::MissingSubdir {
                package: pkg.to_string(),
                subdir: pkg.subdir.clone(),
            });
        }

        let target = dest.join(locked);
        let sum = tokio::task::spawn_blocking(move || {
            tree::copy_tree(&source, &target)?;
            tree::checksum(&target)
        })
        .await??;

        if let Some(expected) = pkg.sum.as_ref().filter(|expected| **expected != sum) {
            return Err(InstallError::ChecksumMismatch {
                package: pkg.locked(),
                expected: expected.clone(),
                actual: sum,
            });
        }

        scratch.close()?;
        Ok(sum)
    }
}
