//! The declared dependency set (`vend.pkg`).
//!
//! A pkgfile states intent only: which coordinates are wanted, at which
//! ref. It is encoded as a flat YAML list of `name@version` strings.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{DecodeError, FileError, Package};

/// Declared dependencies keyed by their `name@version` identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pkgfile {
    deps: BTreeMap<String, Package>,
}

impl Pkgfile {
    /// Create an empty pkgfile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency, replacing any entry with the same identity.
    /// Resolution fields on `pkg` are dropped.
    pub fn insert(&mut self, pkg: &Package) -> Option<Package> {
        let coordinate = pkg.coordinate();
        self.deps.insert(coordinate.to_string(), coordinate)
    }

    /// Remove a dependency by its `name@version` identity, or failing that,
    /// every dependency whose name matches `key`.
    pub fn remove(&mut self, key: &str) -> Vec<Package> {
        if let Some(pkg) = self.deps.remove(key) {
            return vec![pkg];
        }
        let name = crate::clean_path(key);
        let matching: Vec<String> = self
            .deps
            .iter()
            .filter(|(_, p)| p.name() == name)
            .map(|(k, _)| k.clone())
            .collect();
        matching
            .into_iter()
            .filter_map(|k| self.deps.remove(&k))
            .collect()
    }

    /// Look up a dependency by identity.
    pub fn get(&self, key: &str) -> Option<&Package> {
        self.deps.get(key)
    }

    /// Whether a dependency with this identity is declared.
    pub fn contains(&self, key: &str) -> bool {
        self.deps.contains_key(key)
    }

    /// Number of declared dependencies.
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Iterate over declared identities.
    pub fn keys(&self) -> btree_map::Keys<'_, String, Package> {
        self.deps.keys()
    }

    /// Iterate over declared packages in identity order.
    pub fn iter(&self) -> btree_map::Values<'_, String, Package> {
        self.deps.values()
    }

    /// Decode a pkgfile from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the text is not a list of coordinates.
    pub fn from_yaml_str(text: &str) -> Result<Self, DecodeError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Encode the pkgfile as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Yaml`] if the emitter fails.
    pub fn to_yaml_string(&self) -> Result<String, DecodeError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load a pkgfile from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_yaml_str(&content)?)
    }

    /// Save the pkgfile, writing to a temporary file and renaming it into place.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, writing or the rename fails.
    pub fn save(&self, path: &Path) -> Result<(), FileError> {
        let content = self.to_yaml_string()?;
        let temp_path = path.with_extension("pkg.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl FromIterator<Package> for Pkgfile {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut pkgfile = Self::new();
        for pkg in iter {
            pkgfile.insert(&pkg);
        }
        pkgfile
    }
}

impl<'a> IntoIterator for &'a Pkgfile {
    type Item = &'a Package;
    type IntoIter = btree_map::Values<'a, String, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Pkgfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.deps.keys())
    }
}

impl<'de> Deserialize<'de> for Pkgfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let lines = Vec::<String>::deserialize(deserializer)?;
        let mut pkgfile = Pkgfile::new();
        for line in lines {
            let pkg: Package = line.parse().map_err(D::Error::custom)?;
            pkgfile.insert(&pkg);
        }
        Ok(pkgfile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Pkgfile {
        [
            Package::new("github.com", "grafana", "jsonnet-libs", "/ksonnet-util", "master"),
            Package::new("github.com", "grafana", "jsonnet-libs", "oauth2-proxy", "master"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_pkgfile_roundtrip() {
        let pkgfile = sample();
        let text = pkgfile.to_yaml_string().unwrap();
        assert_eq!(
            text,
            "- github.com/grafana/jsonnet-libs/ksonnet-util@master\n\
             - github.com/grafana/jsonnet-libs/oauth2-proxy@master\n"
        );
        assert_eq!(Pkgfile::from_yaml_str(&text).unwrap(), pkgfile);
    }

    #[test]
    fn test_insert_drops_resolution_fields() {
        let mut pkgfile = Pkgfile::new();
        let resolved = Package::new("github.com", "a", "b", "", "v1").with_commit("cafe");
        pkgfile.insert(&resolved);
        let stored = pkgfile.get("github.com/a/b@v1").unwrap();
        assert!(!stored.is_resolved());
    }

    #[test]
    fn test_remove_by_identity_or_name() {
        let mut pkgfile = sample();
        pkgfile.insert(&Package::new("github.com", "grafana", "jsonnet-libs", "ksonnet-util", "v2"));
        assert_eq!(pkgfile.len(), 3);

        let removed = pkgfile.remove("github.com/grafana/jsonnet-libs/oauth2-proxy@master");
        assert_eq!(removed.len(), 1);

        let removed = pkgfile.remove("github.com/grafana/jsonnet-libs/ksonnet-util/");
        assert_eq!(removed.len(), 2);
        assert!(pkgfile.is_empty());
    }

    #[test]
    fn test_rejects_invalid_entries() {
        assert!(Pkgfile::from_yaml_str("- github.com/only-owner").is_err());
        assert!(Pkgfile::from_yaml_str("dependencies: {}").is_err());
        assert!(Pkgfile::from_yaml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(crate::PKGFILE_NAME);
        let pkgfile = sample();
        pkgfile.save(&path).unwrap();
        assert_eq!(Pkgfile::load(&path).unwrap(), pkgfile);
        assert!(!path.with_extension("pkg.tmp").exists());
    }
}
