//! The resolved dependency tree (`vend.lock`).
//!
//! Every root carries its full subtree. The same artifact may appear at
//! several positions in the tree; [`Lockfile::packages`] collapses those
//! into one entry per `name@commit`.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::{DecodeError, FileError, LockLine, LockNode, Package, Pkgfile};

/// Resolved roots keyed by their `name@version` identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lockfile {
    roots: BTreeMap<String, Package>,
}

impl Lockfile {
    /// Create an empty lockfile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolved root, replacing any root with the same identity.
    pub fn insert(&mut self, pkg: Package) -> Option<Package> {
        self.roots.insert(pkg.to_string(), pkg)
    }

    /// Look up a root by identity.
    pub fn get(&self, key: &str) -> Option<&Package> {
        self.roots.get(key)
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the lockfile has no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterate over roots in identity order.
    pub fn iter(&self) -> btree_map::Values<'_, String, Package> {
        self.roots.values()
    }

    /// Flatten the tree into one entry per artifact, keyed by `name@commit`.
    ///
    /// Every node at every depth is visited; nodes sharing a locked identity
    /// collapse into one entry, the last visited winning.
    pub fn packages(&self) -> BTreeMap<String, Package> {
        fn walk(deps: &BTreeMap<String, Package>, out: &mut BTreeMap<String, Package>) {
            for pkg in deps.values() {
                out.insert(pkg.locked(), pkg.clone());
                walk(&pkg.dependencies, out);
            }
        }

        let mut flat = BTreeMap::new();
        walk(&self.roots, &mut flat);
        flat
    }

    /// Names that are pinned to more than one commit anywhere in the tree,
    /// with the commits involved.
    pub fn conflicts(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut commits: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for pkg in self.packages().values() {
            commits
                .entry(pkg.name())
                .or_default()
                .insert(pkg.commit.clone());
        }
        commits.retain(|_, c| c.len() > 1);
        commits
    }

    /// Whether this lockfile's roots are exactly the dependencies `pkgfile` declares.
    pub fn satisfies(&self, pkgfile: &Pkgfile) -> bool {
        self.roots.len() == pkgfile.len() && pkgfile.keys().all(|k| self.roots.contains_key(k))
    }

    /// Copy of the tree with `sums` (keyed by `name@commit`) stamped onto
    /// every matching node.
    pub fn apply_sums(&self, sums: &BTreeMap<String, String>) -> Lockfile {
        fn stamp(pkg: &Package, sums: &BTreeMap<String, String>) -> Package {
            let mut out = pkg.clone();
            if let Some(sum) = sums.get(&pkg.locked()) {
                out.sum = Some(sum.clone());
            }
            out.dependencies = pkg
                .dependencies
                .iter()
                .map(|(k, d)| (k.clone(), stamp(d, sums)))
                .collect();
            out
        }

        Lockfile {
            roots: self
                .roots
                .iter()
                .map(|(k, p)| (k.clone(), stamp(p, sums)))
                .collect(),
        }
    }

    /// Encode the tree as a lock document.
    ///
    /// Nodes without dependencies become plain lock lines, nodes with
    /// dependencies become single-key mappings from their lock line to the
    /// list of encoded dependencies.
    pub fn to_document(&self) -> LockNode {
        fn encode(pkg: &Package) -> LockNode {
            let line = LockLine::from(pkg).to_string();
            if pkg.dependencies.is_empty() {
                LockNode::Leaf(line)
            } else {
                LockNode::Entry {
                    key: line,
                    children: pkg.dependencies.values().map(encode).collect(),
                }
            }
        }

        LockNode::List(self.roots.values().map(encode).collect())
    }

    /// Decode a lock document.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if any lock line is invalid.
    pub fn from_document(node: LockNode) -> Result<Self, DecodeError> {
        let mut roots = BTreeMap::new();
        decode_into(node, &mut roots)?;
        Ok(Self { roots })
    }

    /// Decode a lockfile from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] for invalid YAML, foreign document shapes
    /// or invalid lock lines.
    pub fn from_yaml_str(text: &str) -> Result<Self, DecodeError> {
        Self::from_document(LockNode::parse(text)?)
    }

    /// Encode the lockfile as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Yaml`] if the emitter fails.
    pub fn to_yaml_string(&self) -> Result<String, DecodeError> {
        self.to_document().render()
    }

    /// Load a lockfile from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_yaml_str(&content)?)
    }

    /// Save the lockfile, writing to a temporary file and renaming it into place.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, writing or the rename fails.
    pub fn save(&self, path: &Path) -> Result<(), FileError> {
        let content = self.to_yaml_string()?;
        let temp_path = path.with_extension("lock.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

fn decode_into(node: LockNode, scope: &mut BTreeMap<String, Package>) -> Result<(), DecodeError> {
    match node {
        LockNode::List(items) => {
            for item in items {
                decode_into(item, scope)?;
            }
        }
        LockNode::Entry { key, children } => {
            let mut pkg = key.parse::<LockLine>()?.into_package();
            let mut deps = BTreeMap::new();
            for child in children {
                decode_into(child, &mut deps)?;
            }
            pkg.dependencies = deps;
            scope.insert(pkg.to_string(), pkg);
        }
        LockNode::Leaf(line) => {
            let pkg = line.parse::<LockLine>()?.into_package();
            scope.insert(pkg.to_string(), pkg);
        }
    }
    Ok(())
}

impl FromIterator<Package> for Lockfile {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        Self {
            roots: iter.into_iter().map(|p| (p.to_string(), p)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Lockfile {
    type Item = &'a Package;
    type IntoIter = btree_map::Values<'a, String, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
