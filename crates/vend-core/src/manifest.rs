//! Upstream manifest parsing (`jsonnetfile.json`).
//!
//! Packages declare their own dependencies in the jsonnet-bundler format:
//!
//! ```json
//! {
//!   "dependencies": [
//!     {
//!       "source": { "git": { "remote": "https://github.com/grafana/jsonnet-libs", "subdir": "ksonnet-util" } },
//!       "version": "master"
//!     }
//!   ]
//! }
//! ```
//!
//! The older `"github": { "user", "repo", "subdir" }` source form is accepted
//! as well. Local sources have no remote coordinate and are skipped.

use serde::Deserialize;
use thiserror::Error;

use vend_schema::{DEFAULT_VERSION, Package, Pkgfile};

/// File name of the manifest inside a package directory.
pub const MANIFEST_NAME: &str = "jsonnetfile.json";

const GITHUB_HOST: &str = "github.com";

/// A manifest could not be understood.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Not valid JSON, or fields of the wrong type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The git remote is not a `host/owner/repo` URL.
    #[error("Unsupported git remote '{0}'")]
    Remote(String),

    /// The document is valid JSON but not an object.
    #[error("Manifest is not a JSON object")]
    NotAnObject,

    /// A dependency names neither a git nor a github source.
    #[error("Dependency has no git or github source")]
    MissingSource,
}

#[derive(Debug, Deserialize)]
struct JsonnetFile {
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    source: Source,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct Source {
    git: Option<GitSource>,
    github: Option<GitHubSource>,
    local: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GitSource {
    remote: String,
    #[serde(default)]
    subdir: String,
}

#[derive(Debug, Deserialize)]
struct GitHubSource {
    user: String,
    repo: String,
    #[serde(default)]
    subdir: String,
}

/// Parse manifest text into the set of dependencies it declares.
///
/// # Errors
///
/// Returns an error for invalid JSON, a document that is not an object,
/// unsupported remotes, or dependencies without a usable source.
pub fn parse(text: &str) -> Result<Pkgfile, ManifestError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ManifestError::NotAnObject);
    }
    let file: JsonnetFile = serde_json::from_value(value)?;
    let mut pkgfile = Pkgfile::new();

    for dep in file.dependencies {
        let version = if dep.version.trim().is_empty() {
            DEFAULT_VERSION.to_string()
        } else {
            dep.version.trim().to_string()
        };

        let pkg = match dep.source {
            Source { git: Some(git), .. } => {
                let (host, owner, repo) = parse_remote(&git.remote)?;
                Package::new(host, owner, repo, &git.subdir, version)
            }
            Source { github: Some(gh), .. } => {
                Package::new(GITHUB_HOST, gh.user, gh.repo, &gh.subdir, version)
            }
            Source { local: Some(_), .. } => {
                tracing::debug!("Skipping local dependency");
                continue;
            }
            _ => return Err(ManifestError::MissingSource),
        };
        pkgfile.insert(&pkg);
    }

    Ok(pkgfile)
}

/// Split a git remote into `(host, owner, repo)`.
///
/// Accepts `https://host/owner/repo(.git)`, `http://...`, `ssh://git@host/owner/repo`
/// and scp-like `git@host:owner/repo(.git)`.
fn parse_remote(remote: &str) -> Result<(String, String, String), ManifestError> {
    let unsupported = || ManifestError::Remote(remote.to_string());
    let trimmed = remote.trim();

    let path = if let Some(rest) = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .or_else(|| trimmed.strip_prefix("ssh://"))
    {
        rest.rsplit_once('@').map_or(rest, |(_, r)| r).to_string()
    } else if let Some(rest) = trimmed.strip_prefix("git@") {
        rest.replacen(':', "/", 1)
    } else {
        return Err(unsupported());
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [host, owner, repo] if !host.is_empty() && !owner.is_empty() && !repo.is_empty() => {
            Ok(((*host).to_string(), (*owner).to_string(), (*repo).to_string()))
        }
        _ => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_git_and_github_sources() {
        let text = r#"{
            "version": 1,
            "dependencies": [
                {
                    "source": { "git": { "remote": "https://github.com/grafana/jsonnet-libs.git", "subdir": "ksonnet-util" } },
                    "version": "master"
                },
                {
                    "source": { "github": { "user": "kausalco", "repo": "public", "subdir": "grafana-builder" } },
                    "version": ""
                },
                {
                    "source": { "git": { "remote": "git@github.com:ksonnet/ksonnet-lib" } },
                    "version": "v0.1.0"
                },
                {
                    "source": { "local": { "directory": "lib" } }
                }
            ]
        }"#;

        let pkgfile = parse(text).unwrap();
        let keys: Vec<&String> = pkgfile.keys().collect();
        assert_eq!(
            keys,
            [
                "github.com/grafana/jsonnet-libs/ksonnet-util@master",
                "github.com/kausalco/public/grafana-builder@master",
                "github.com/ksonnet/ksonnet-lib@v0.1.0",
            ]
        );
    }

    #[test]
    fn test_empty_manifest() {
        assert!(parse("{}").unwrap().is_empty());
        assert!(parse(r#"{"dependencies": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_remote() {
        let expected = ("github.com".to_string(), "org".to_string(), "repo".to_string());
        for remote in [
            "https://github.com/org/repo",
            "https://github.com/org/repo.git",
            "https://github.com/org/repo/",
            "ssh://git@github.com/org/repo.git",
            "git@github.com:org/repo.git",
        ] {
            assert_eq!(parse_remote(remote).unwrap(), expected, "{remote}");
        }
        assert!(parse_remote("file:///tmp/repo").is_err());
        assert!(parse_remote("https://gitlab.com/group/sub/repo").is_err());
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(parse("[]"), Err(ManifestError::NotAnObject)));
        assert!(matches!(parse("[[]]"), Err(ManifestError::NotAnObject)));
        assert!(matches!(parse("null"), Err(ManifestError::NotAnObject)));
        assert!(matches!(parse("{ not json"), Err(ManifestError::Json(_))));
        assert!(matches!(
            parse(r#"{"dependencies": [{"source": {}}]}"#),
            Err(ManifestError::MissingSource)
        ));
    }
}
