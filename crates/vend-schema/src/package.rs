//! Package coordinates and their canonical identities.
//!
//! A [`Package`] names a directory inside a hosted repository at a ref.
//! Three identities are derived from it:
//!
//! - [`Package::name`]: `host/owner/repo/subdir`, path-cleaned. Ignores the version.
//! - `to_string()`: `name@version`, the declared identity.
//! - [`Package::locked`]: `name@commit`, the installed-artifact identity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::DecodeError;

/// Ref assumed when a coordinate string carries no `@version` suffix.
pub const DEFAULT_VERSION: &str = "master";

/// A dependency coordinate, optionally carrying its resolution results.
///
/// `commit`, `sum` and `dependencies` are only populated once the package
/// has been resolved. An empty `dependencies` map on a resolved package
/// means the package declared no dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Package {
    /// Code host, e.g. `github.com`.
    pub host: String,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Directory inside the repository, stored as `""` or `/path`.
    pub subdir: String,
    /// Branch or tag the dependency tracks.
    pub version: String,
    /// Immutable commit the version resolved to. Empty until resolved.
    pub commit: String,
    /// Content checksum of the installed subdir, if known.
    pub sum: Option<String>,
    /// Resolved direct dependencies, keyed by their declared identity.
    pub dependencies: BTreeMap<String, Package>,
}

impl Package {
    /// Create an unresolved coordinate. `subdir` is normalized so that
    /// `"x"`, `"/x"` and `"x/"` are stored identically.
    pub fn new(
        host: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        subdir: &str,
        version: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            owner: owner.into(),
            repo: repo.into(),
            subdir: normalize_subdir(subdir),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Set the resolved commit.
    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    /// Set the content checksum.
    pub fn with_sum(mut self, sum: impl Into<String>) -> Self {
        self.sum = Some(sum.into());
        self
    }

    /// Replace the dependency map with `deps`, keyed by their declared identity.
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = Package>) -> Self {
        self.dependencies = deps.into_iter().map(|d| (d.to_string(), d)).collect();
        self
    }

    /// Cleaned `host/owner/repo/subdir`. The dedup key that ignores the version.
    pub fn name(&self) -> String {
        clean_path(&format!(
            "{}/{}/{}/{}",
            self.host, self.owner, self.repo, self.subdir
        ))
    }

    /// `name@commit`, the identity of the installed artifact.
    ///
    /// Only meaningful once [`Package::is_resolved`] is true.
    pub fn locked(&self) -> String {
        format!("{}@{}", self.name(), self.commit)
    }

    /// Whether a commit has been assigned.
    pub fn is_resolved(&self) -> bool {
        !self.commit.is_empty()
    }

    /// The bare coordinate, with every resolution field cleared.
    pub fn coordinate(&self) -> Package {
        Package {
            host: self.host.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            subdir: self.subdir.clone(),
            version: self.version.clone(),
            ..Package::default()
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name(), self.version)
    }
}

impl FromStr for Package {
    type Err = DecodeError;

    /// Parse `host/owner/repo[/subdir][@version]`. A subdir may itself
    /// contain '@'.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DecodeError::InvalidCoordinate(s.to_string());

        // The version follows the last '@'; earlier ones belong to the path.
        let (name, version) = match s.rsplit_once('@') {
            Some((_, "")) => return Err(invalid()),
            Some((name, version)) if !version.contains('/') => (name, version),
            _ => (s, DEFAULT_VERSION),
        };

        let mut segments = name.splitn(4, '/');
        let (Some(host), Some(owner), Some(repo)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };
        if host.is_empty() || owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }
        let subdir = segments.next().unwrap_or("");

        Ok(Package::new(host, owner, repo, subdir, version))
    }
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` segments, resolves `..` against
/// the preceding segment and removes trailing slashes. An empty result is
/// `"."`, or `"/"` for rooted input.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn normalize_subdir(subdir: &str) -> String {
    let cleaned = clean_path(&format!("/{subdir}"));
    if cleaned == "/" { String::new() } else { cleaned }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("a//b/./c/"), "a/b/c");
        assert_eq!(clean_path("a/b/../c"), "a/c");
        assert_eq!(clean_path("/../a"), "/a");
        assert_eq!(clean_path("../a"), "../a");
        assert_eq!(clean_path(""), ".");
        assert_eq!(clean_path("/"), "/");
    }

    #[test]
    fn test_name_normalizes_subdir_spellings() {
        let names: Vec<String> = ["a/b", "/a/b", "a/b/", "//a//b//"]
            .iter()
            .map(|s| Package::new("github.com", "org", "repo", s, "master").name())
            .collect();
        for name in &names {
            assert_eq!(name, "github.com/org/repo/a/b");
        }
    }

    #[test]
    fn test_subdir_stored_canonically() {
        let a = Package::new("github.com", "org", "repo", "x/", "v1");
        let b = Package::new("github.com", "org", "repo", "/x", "v1");
        assert_eq!(a, b);
        assert_eq!(a.subdir, "/x");
        assert_eq!(Package::new("github.com", "org", "repo", "/", "v1").subdir, "");
    }

    #[test]
    fn test_identities() {
        let pkg = Package::new("github.com", "grafana", "jsonnet-libs", "ksonnet-util", "master")
            .with_commit("7ac7da1a0fe165b68cdb718b2521b560d51bd1f4");
        assert_eq!(pkg.name(), "github.com/grafana/jsonnet-libs/ksonnet-util");
        assert_eq!(
            pkg.to_string(),
            "github.com/grafana/jsonnet-libs/ksonnet-util@master"
        );
        assert_eq!(
            pkg.locked(),
            "github.com/grafana/jsonnet-libs/ksonnet-util@7ac7da1a0fe165b68cdb718b2521b560d51bd1f4"
        );
        assert!(pkg.is_resolved());
        assert!(!pkg.coordinate().is_resolved());
    }

    #[test]
    fn test_parse_coordinate() {
        let pkg: Package = "github.com/grafana/jsonnet-libs/ksonnet-util@master"
            .parse()
            .unwrap();
        assert_eq!(pkg.host, "github.com");
        assert_eq!(pkg.owner, "grafana");
        assert_eq!(pkg.repo, "jsonnet-libs");
        assert_eq!(pkg.subdir, "/ksonnet-util");
        assert_eq!(pkg.version, "master");

        let nested: Package = "github.com/a/b/c/d@v1.2".parse().unwrap();
        assert_eq!(nested.subdir, "/c/d");
        assert_eq!(nested.version, "v1.2");

        let at_subdir: Package = "github.com/a/b/lib@2@v1".parse().unwrap();
        assert_eq!(at_subdir.subdir, "/lib@2");
        assert_eq!(at_subdir.version, "v1");

        let at_unversioned: Package = "github.com/a/b/lib@2/inner".parse().unwrap();
        assert_eq!(at_unversioned.subdir, "/lib@2/inner");
        assert_eq!(at_unversioned.version, DEFAULT_VERSION);

        let bare: Package = "github.com/a/b".parse().unwrap();
        assert_eq!(bare.subdir, "");
        assert_eq!(bare.version, DEFAULT_VERSION);
    }

    #[test]
    fn test_parse_rejects_bad_coordinates() {
        for bad in ["github.com/a", "github.com//b@v1", "github.com/a/b@", "", "@v1"] {
            assert!(
                matches!(bad.parse::<Package>(), Err(DecodeError::InvalidCoordinate(_))),
                "{bad} should not parse"
            );
        }
    }
}
