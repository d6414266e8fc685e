//! Decode and file errors.

use thiserror::Error;

/// Errors raised while turning text into packages, pkgfiles or lockfiles.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The underlying YAML document could not be parsed or emitted.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A lock document node had a shape other than list, single-key mapping or string.
    #[error("Malformed lock entry: {0}")]
    Malformed(String),

    /// A coordinate string is not `host/owner/repo[/subdir][@version]`.
    #[error("Invalid package coordinate: '{0}'")]
    InvalidCoordinate(String),

    /// A lock line carries no `commit:` field.
    #[error("Lock line has no commit: '{0}'")]
    MissingCommit(String),
}

/// Errors raised by the `load`/`save` helpers.
#[derive(Error, Debug)]
pub enum FileError {
    /// Reading or writing the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] DecodeError),
}
