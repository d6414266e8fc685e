//! Recursive dependency resolution.
//!
//! Each declared package is resolved in two remote steps: its ref is pinned
//! to a commit, then its own manifest is read at that commit. The packages
//! that manifest declares are resolved concurrently as siblings, and the
//! parent is complete once all of them are.
//!
//! A semaphore bounds the number of remote calls in flight. Permits are held
//! for a single call only, never while a parent waits on its children.
//! Every branch carries the chain of identities above it, so a manifest
//! cycle fails with [`ResolveError::Cycle`] instead of recursing forever.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::task::JoinSet;

use vend_schema::{Lockfile, Package, Pkgfile};

use crate::error::{RemoteError, ResolveError};
use crate::reporter::{NullReporter, Reporter};

/// Source of package metadata.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Pin `pkg.version` to an immutable commit id.
    async fn commit(&self, pkg: &Package) -> Result<String, RemoteError>;

    /// Dependencies declared by `pkg` at `pkg.commit`. A package without a
    /// manifest has no dependencies; that is not an error.
    async fn deps(&self, pkg: &Package) -> Result<Pkgfile, RemoteError>;
}

/// Resolves declared packages into fully resolved trees.
#[derive(Clone)]
pub struct Engine {
    resolver: Arc<dyn Resolver>,
    permits: Arc<Semaphore>,
    reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine allowing at most `jobs` concurrent remote calls.
    pub fn new(resolver: Arc<dyn Resolver>, jobs: usize) -> Self {
        Self {
            resolver,
            permits: Arc::new(Semaphore::new(jobs.max(1))),
            reporter: Arc::new(NullReporter),
        }
    }

    /// Report progress to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Resolve a single declared package and everything below it.
    ///
    /// # Errors
    ///
    /// Returns the first remote failure in the tree, or
    /// [`ResolveError::Cycle`] if a package transitively depends on itself.
    pub async fn resolve(&self, declared: &Package) -> Result<Package, ResolveError> {
        resolve_node(self.clone(), declared.coordinate(), Vec::new()).await
    }

    /// Resolve every package in `pkgfile` as an independent root.
    ///
    /// # Errors
    ///
    /// Returns the first error from any root.
    pub async fn resolve_all(&self, pkgfile: &Pkgfile) -> Result<Lockfile, ResolveError> {
        tracing::debug!("Resolving {} dependencies", pkgfile.len());
        let declared = pkgfile.iter().map(Package::coordinate).collect();
        let roots = resolve_siblings(self.clone(), declared, Vec::new()).await?;
        tracing::debug!("Resolved {} roots", roots.len());
        Ok(roots.into_iter().collect())
    }

    async fn permit(&self) -> Result<SemaphorePermit<'_>, ResolveError> {
        self.permits
            .acquire()
            .await
            .map_err(|_| ResolveError::Cancelled)
    }
}

fn resolve_node(
    engine: Engine,
    declared: Package,
    mut chain: Vec<String>,
) -> BoxFuture<'static, Result<Package, ResolveError>> {
    async move {
        let id = declared.to_string();
        if chain.contains(&id) {
            chain.push(id);
            return Err(ResolveError::Cycle { chain });
        }
        chain.push(id.clone());
        engine.reporter.resolving(&declared);

        let remote = |source| ResolveError::Remote {
            package: id.clone(),
            source,
        };

        let commit = {
            let _permit = engine.permit().await?;
            tracing::trace!("Pinning {id}");
            engine.resolver.commit(&declared).await.map_err(remote)?
        };
        let pinned = declared.with_commit(commit);

        let manifest = {
            let _permit = engine.permit().await?;
            tracing::trace!("Reading manifest of {}", pinned.locked());
            engine.resolver.deps(&pinned).await.map_err(remote)?
        };

        let declared_deps = manifest.iter().map(Package::coordinate).collect();
        let children = resolve_siblings(engine, declared_deps, chain).await?;
        tracing::debug!("Resolved {} ({} dependencies)", pinned.locked(), children.len());

        Ok(pinned.with_dependencies(children))
    }
    .boxed()
}

/// Resolve `declared` concurrently. The first failure aborts the remaining
/// siblings and is returned.
async fn resolve_siblings(
    engine: Engine,
    declared: Vec<Package>,
    chain: Vec<String>,
) -> Result<Vec<Package>, ResolveError> {
    let mut set = JoinSet::new();
    for pkg in declared {
        set.spawn(resolve_node(engine.clone(), pkg, chain.clone()));
    }

    let mut resolved = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined? {
            Ok(pkg) => resolved.push(pkg),
            Err(e) => {
                set.abort_all();
                return Err(e);
            }
        }
    }
    Ok(resolved)
}
