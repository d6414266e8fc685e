//! Shared types and document formats for vend.
//!
//! Everything in this crate is pure data: package coordinates, the declared
//! dependency set (`vend.pkg`) and the resolved lock tree (`vend.lock`),
//! together with their YAML encodings. Network and filesystem side effects
//! live in `vend-core`.

pub mod document;
pub mod error;
pub mod lock_line;
pub mod lockfile;
pub mod package;
pub mod pkgfile;

// Re-exports
pub use document::LockNode;
pub use error::{DecodeError, FileError};
pub use lock_line::LockLine;
pub use lockfile::Lockfile;
pub use package::{DEFAULT_VERSION, Package, clean_path};
pub use pkgfile::Pkgfile;

/// Default file name of the declared dependency set.
pub const PKGFILE_NAME: &str = "vend.pkg";

/// Default file name of the lock document.
pub const LOCKFILE_NAME: &str = "vend.lock";

/// Default destination root for installed packages.
pub const VENDOR_DIR: &str = "vendor";
