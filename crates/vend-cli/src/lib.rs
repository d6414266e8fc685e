//! vend - vendor jsonnet dependencies from GitHub
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! # Project Layout
//!
//! ```text
//! project/
//! ├── vend.pkg    # Declared dependencies, one coordinate per entry
//! ├── vend.lock   # Resolved tree, pinned to commits
//! └── vendor/     # One directory per artifact: name@commit
//! ```

pub mod cmd;
pub mod context;
pub mod ui;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use vend_core::Config;
use vend_core::config;

#[derive(Debug, Parser)]
#[command(name = "vend")]
#[command(author, version, about = "vend - vendor jsonnet dependencies from GitHub")]
pub struct Cli {
    /// Project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an empty vend.pkg
    Init,
    /// Declare dependencies in vend.pkg
    Add {
        /// Coordinates: host/owner/repo[/subdir][@version]
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Resolve vend.pkg and write vend.lock
    Lock {
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Install locked dependencies into vendor/
    Install {
        /// Re-resolve even if vend.lock is up to date
        #[arg(long)]
        update: bool,

        #[command(flatten)]
        remote: RemoteArgs,
    },
}

/// Remote access settings, each overridable through the environment.
#[derive(Debug, Clone, Args)]
pub struct RemoteArgs {
    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Maximum concurrent remote calls
    #[arg(short, long, env = "VEND_JOBS")]
    pub jobs: Option<usize>,

    /// GitHub API base URL
    #[arg(long, env = "VEND_GITHUB_API")]
    pub api_url: Option<String>,

    /// Raw file base URL
    #[arg(long, env = "VEND_GITHUB_RAW")]
    pub raw_url: Option<String>,

    /// Tarball base URL
    #[arg(long, env = "VEND_GITHUB_CODELOAD")]
    pub codeload_url: Option<String>,

    /// Scratch directory for downloads
    #[arg(long, env = "VEND_TMP")]
    pub tmp: Option<PathBuf>,
}

impl RemoteArgs {
    /// Layer the flags over the default configuration.
    pub fn config(&self) -> Config {
        let jobs = self.jobs.map(|j| j.to_string());
        let tmp = self.tmp.as_ref().map(|p| p.to_string_lossy().into_owned());

        Config::from_lookup(|key| match key {
            config::TOKEN_VAR => self.token.clone(),
            config::JOBS_VAR => jobs.clone(),
            config::API_URL_VAR => self.api_url.clone(),
            config::RAW_URL_VAR => self.raw_url.clone(),
            config::CODELOAD_URL_VAR => self.codeload_url.clone(),
            config::SCRATCH_DIR_VAR => tmp.clone(),
            _ => None,
        })
    }
}
