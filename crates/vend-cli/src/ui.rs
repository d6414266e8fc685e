//! Console output for commands.

use vend_core::{Package, Reporter};

/// Prints progress lines to stderr. Quiet mode keeps warnings and failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print an informational line unless quiet.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{msg}");
        }
    }
}

impl Reporter for ConsoleReporter {
    fn resolving(&self, pkg: &Package) {
        tracing::debug!("Resolving {pkg}");
    }

    fn installing(&self, pkg: &Package) {
        tracing::debug!("Installing {}", pkg.locked());
    }

    fn done(&self, pkg: &Package, detail: &str) {
        self.info(&format!("  {} {detail}", pkg.locked()));
    }

    fn failed(&self, pkg: &Package, reason: &str) {
        eprintln!("  {pkg} failed: {reason}");
    }

    fn warning(&self, msg: &str) {
        eprintln!("warning: {msg}");
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        self.info(&format!("{action}: {count} package(s) in {elapsed_secs:.2}s"));
    }
}
