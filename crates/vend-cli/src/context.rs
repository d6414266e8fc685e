//! Project paths and file loading shared by commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use vend_schema::{LOCKFILE_NAME, Lockfile, PKGFILE_NAME, Pkgfile, VENDOR_DIR};

/// A project directory holding `vend.pkg`, `vend.lock` and `vendor/`.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pkgfile_path(&self) -> PathBuf {
        self.root.join(PKGFILE_NAME)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCKFILE_NAME)
    }

    pub fn vendor_dir(&self) -> PathBuf {
        self.root.join(VENDOR_DIR)
    }

    /// Load `vend.pkg`, failing if it does not exist.
    pub fn load_pkgfile(&self) -> Result<Pkgfile> {
        let path = self.pkgfile_path();
        if !path.exists() {
            bail!("{} not found (run `vend init` first)", path.display());
        }
        Pkgfile::load(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Load `vend.lock` if present.
    pub fn load_lockfile(&self) -> Result<Option<Lockfile>> {
        let path = self.lockfile_path();
        if !path.exists() {
            return Ok(None);
        }
        Lockfile::load(&path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    pub fn save_pkgfile(&self, pkgfile: &Pkgfile) -> Result<()> {
        let path = self.pkgfile_path();
        pkgfile
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn save_lockfile(&self, lockfile: &Lockfile) -> Result<()> {
        let path = self.lockfile_path();
        lockfile
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_files() {
        let dir = tempdir().unwrap();
        let project = Project::new(dir.path());
        assert!(project.load_pkgfile().is_err());
        assert!(project.load_lockfile().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let project = Project::new(dir.path());

        let pkgfile: Pkgfile = ["github.com/org/a@v1".parse::<vend_schema::Package>().unwrap()]
            .into_iter()
            .collect();
        project.save_pkgfile(&pkgfile).unwrap();
        assert_eq!(project.load_pkgfile().unwrap(), pkgfile);
        assert_eq!(project.vendor_dir(), dir.path().join("vendor"));
    }
}
