//! Remote endpoints, credentials and concurrency settings.

use std::path::PathBuf;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Default endpoint serving raw repository files.
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
/// Default endpoint serving repository tarballs.
pub const DEFAULT_CODELOAD_URL: &str = "https://codeload.github.com";

/// Access token variable.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Concurrency limit variable.
pub const JOBS_VAR: &str = "VEND_JOBS";
/// API endpoint variable.
pub const API_URL_VAR: &str = "VEND_GITHUB_API";
/// Raw file endpoint variable.
pub const RAW_URL_VAR: &str = "VEND_GITHUB_RAW";
/// Tarball endpoint variable.
pub const CODELOAD_URL_VAR: &str = "VEND_GITHUB_CODELOAD";
/// Scratch directory variable.
pub const SCRATCH_DIR_VAR: &str = "VEND_TMP";

/// Settings for remote access and scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Optional access token sent with every GitHub request.
    pub token: Option<String>,
    /// Upper bound on concurrent remote calls during resolution.
    pub jobs: usize,
    /// GitHub REST API base URL.
    pub api_url: String,
    /// Raw file base URL.
    pub raw_url: String,
    /// Tarball base URL.
    pub codeload_url: String,
    /// Parent directory for per-artifact scratch directories.
    pub scratch_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            jobs: default_jobs(),
            api_url: DEFAULT_API_URL.to_string(),
            raw_url: DEFAULT_RAW_URL.to_string(),
            codeload_url: DEFAULT_CODELOAD_URL.to_string(),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

impl Config {
    /// Build a configuration from a lookup keyed by environment variable
    /// name. Unset, empty or unparsable values fall back to the defaults.
    ///
    /// | key                    | field          |
    /// |------------------------|----------------|
    /// | `GITHUB_TOKEN`         | `token`        |
    /// | `VEND_JOBS`            | `jobs`         |
    /// | `VEND_GITHUB_API`      | `api_url`      |
    /// | `VEND_GITHUB_RAW`      | `raw_url`      |
    /// | `VEND_GITHUB_CODELOAD` | `codeload_url` |
    /// | `VEND_TMP`             | `scratch_dir`  |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            token: get(TOKEN_VAR),
            jobs: get(JOBS_VAR)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|j| *j > 0)
                .unwrap_or(defaults.jobs),
            api_url: get(API_URL_VAR).map_or(defaults.api_url, trim_url),
            raw_url: get(RAW_URL_VAR).map_or(defaults.raw_url, trim_url),
            codeload_url: get(CODELOAD_URL_VAR).map_or(defaults.codeload_url, trim_url),
            scratch_dir: get(SCRATCH_DIR_VAR).map_or(defaults.scratch_dir, PathBuf::from),
        }
    }
}

fn default_jobs() -> usize {
    num_cpus::get() * 4
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
