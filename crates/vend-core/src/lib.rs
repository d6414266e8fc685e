//! Resolution and installation engine for vend.
//!
//! - [`resolver`]: expands declared dependencies into a resolved tree.
//! - [`installer`]: materializes a flattened lock tree into a vendor directory.
//! - [`github`]: collaborators that talk to GitHub.
//! - [`manifest`]: the upstream `jsonnetfile.json` format.

pub mod config;
pub mod error;
pub mod github;
pub mod installer;
pub mod io;
pub mod manifest;
pub mod reporter;
pub mod resolver;

pub use config::Config;
pub use error::{InstallError, RemoteError, ResolveError};
pub use installer::{Installer, Orchestrator};
pub use reporter::{NullReporter, Reporter, TracingReporter};
pub use resolver::{Engine, Resolver};

pub use vend_schema::{Lockfile, Package, Pkgfile};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("vend-core/", env!("CARGO_PKG_VERSION"));
