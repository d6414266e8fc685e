//! The one-line text form of a resolved package:
//! `name@version commit:<id>[ sum:<checksum>]`.

use std::fmt;
use std::str::FromStr;

use crate::{DecodeError, Package};

/// Field prefix carrying the resolved commit.
pub const COMMIT_PREFIX: &str = "commit:";

/// Field prefix carrying the content checksum.
pub const SUM_PREFIX: &str = "sum:";

/// A parsed lock line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLine {
    /// The declared coordinate, without resolution fields.
    pub coordinate: Package,
    /// Resolved commit id.
    pub commit: String,
    /// Optional content checksum.
    pub sum: Option<String>,
}

impl LockLine {
    /// Turn the line into a resolved package with no dependencies.
    pub fn into_package(self) -> Package {
        let mut pkg = self.coordinate.with_commit(self.commit);
        pkg.sum = self.sum;
        pkg
    }
}

impl From<&Package> for LockLine {
    fn from(pkg: &Package) -> Self {
        Self {
            coordinate: pkg.coordinate(),
            commit: pkg.commit.clone(),
            sum: pkg.sum.clone(),
        }
    }
}

impl fmt::Display for LockLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {COMMIT_PREFIX}{}", self.coordinate, self.commit)?;
        if let Some(sum) = &self.sum {
            write!(f, " {SUM_PREFIX}{sum}")?;
        }
        Ok(())
    }
}

impl FromStr for LockLine {
    type Err = DecodeError;

    /// Parse a lock line. Whitespace runs are treated as single separators
    /// and the `commit:`/`sum:` fields may appear in any order. Unknown
    /// fields are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();
        let coordinate: Package = fields
            .next()
            .ok_or_else(|| DecodeError::Malformed("empty lock line".to_string()))?
            .parse()?;

        let mut commit = None;
        let mut sum = None;
        for field in fields {
            if let Some(value) = field.strip_prefix(COMMIT_PREFIX) {
                commit = Some(value.to_string());
            } else if let Some(value) = field.strip_prefix(SUM_PREFIX) {
                sum = Some(value.to_string());
            }
        }

        let commit = commit
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DecodeError::MissingCommit(s.trim().to_string()))?;

        Ok(Self {
            coordinate,
            commit,
            sum: sum.filter(|s| !s.is_empty()),
        })
    }
}
