//! Error types shared by the resolution and install phases.

use thiserror::Error;

use crate::manifest::ManifestError;

/// A collaborator failed to answer: transport failure, unexpected status,
/// or a response that could not be understood.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The request could not be sent or its body not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The manifest at `url` could not be parsed.
    #[error("Invalid manifest at {url}: {source}")]
    Manifest {
        /// Manifest URL.
        url: String,
        /// Parse failure.
        #[source]
        source: ManifestError,
    },

    /// The package is hosted somewhere this collaborator cannot reach.
    #[error("Unsupported host '{0}'")]
    UnsupportedHost(String),

    /// Any other unusable response.
    #[error("{0}")]
    Other(String),
}

/// Resolution of a dependency tree failed.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A remote call for `package` failed.
    #[error("Failed to resolve {package}: {source}")]
    Remote {
        /// Declared identity of the failing package.
        package: String,
        /// Underlying failure.
        #[source]
        source: RemoteError,
    },

    /// A package depends on itself; `chain` runs from the first occurrence to the repeat.
    #[error("Dependency cycle: {}", chain.join(" -> "))]
    Cycle {
        /// Identities along the cycle.
        chain: Vec<String>,
    },

    /// A resolution task panicked or was aborted.
    #[error("Resolution task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The concurrency limiter was closed.
    #[error("Resolution was cancelled")]
    Cancelled,
}

/// Materializing an artifact into the vendor tree failed.
#[derive(Error, Debug)]
pub enum InstallError {
    /// Fetching the artifact failed.
    #[error("Download failed: {0}")]
    Remote(#[from] RemoteError),

    /// A filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is corrupt or has entries outside the destination.
    #[error("Failed to extract archive: {0}")]
    Extract(String),

    /// The package carries no commit.
    #[error("{package} has not been resolved to a commit")]
    Unresolved {
        /// Declared identity.
        package: String,
    },

    /// The artifact path is not a plain relative path.
    #[error("{package}: refusing to install outside the destination ({path})")]
    InvalidPath {
        /// Declared identity.
        package: String,
        /// Rejected path.
        path: String,
    },

    /// The repository has no such subdirectory.
    #[error("{package}: subdirectory '{subdir}' not found in repository")]
    MissingSubdir {
        /// Declared identity.
        package: String,
        /// Missing subdirectory.
        subdir: String,
    },

    /// The installed tree does not match the recorded sum.
    #[error("{package}: checksum mismatch, expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Artifact identity.
        package: String,
        /// Recorded sum.
        expected: String,
        /// Computed sum.
        actual: String,
    },

    /// A blocking install task panicked or was aborted.
    #[error("Install task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<reqwest::Error> for InstallError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(RemoteError::Http(err))
    }
}
