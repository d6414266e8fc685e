//! Reporter trait for dependency injection
//!
//! Lets the engine report progress without being coupled to a specific
//! terminal output.

use vend_schema::Package;

/// Receives progress events from resolution and installation.
pub trait Reporter: Send + Sync {
    /// A package is being resolved.
    fn resolving(&self, pkg: &Package);

    /// An artifact is being installed.
    fn installing(&self, pkg: &Package);

    /// An operation on a package finished successfully.
    fn done(&self, pkg: &Package, detail: &str);

    /// An operation on a package failed.
    fn failed(&self, pkg: &Package, reason: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn resolving(&self, pkg: &Package) {
        (**self).resolving(pkg);
    }
    fn installing(&self, pkg: &Package) {
        (**self).installing(pkg);
    }
    fn done(&self, pkg: &Package, detail: &str) {
        (**self).done(pkg, detail);
    }
    fn failed(&self, pkg: &Package, reason: &str) {
        (**self).failed(pkg, reason);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn resolving(&self, _: &Package) {}
    fn installing(&self, _: &Package) {}
    fn done(&self, _: &Package, _: &str) {}
    fn failed(&self, _: &Package, _: &str) {}
    fn warning(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}

/// Forwards every event to `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn resolving(&self, pkg: &Package) {
        tracing::debug!("Resolving {pkg}");
    }
    fn installing(&self, pkg: &Package) {
        tracing::info!("Installing {}", pkg.locked());
    }
    fn done(&self, pkg: &Package, detail: &str) {
        tracing::info!("{pkg}: {detail}");
    }
    fn failed(&self, pkg: &Package, reason: &str) {
        tracing::error!("{pkg}: {reason}");
    }
    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        tracing::info!("{action}: {count} package(s) in {elapsed_secs:.2}s");
    }
}
