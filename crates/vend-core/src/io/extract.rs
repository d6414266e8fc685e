//! Tarball extraction.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::error::InstallError;

/// Unpack a `.tar.gz` repository snapshot into `dest`, dropping the single
/// top-level directory the archive wraps everything in.
///
/// Symlinks may only point below their own directory, and nothing is
/// written through a directory that resolves outside `dest`.
///
/// Blocking; call from `spawn_blocking` in async contexts.
///
/// # Errors
///
/// Returns [`InstallError::Extract`] for corrupt archives or entries whose
/// paths would land outside `dest`.
pub fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<(), InstallError> {
    let file = File::open(archive)?;
    let mut tar = Archive::new(GzDecoder::new(BufReader::new(file)));
    fs::create_dir_all(dest)?;
    let root = fs::canonicalize(dest)?;

    let entries = tar
        .entries()
        .map_err(|e| InstallError::Extract(e.to_string()))?;
    let mut unpacked = 0usize;

    for entry in entries {
        let mut entry = entry.map_err(|e| InstallError::Extract(e.to_string()))?;
        let entry_type = entry.header().entry_type();
        if matches!(entry_type, EntryType::XGlobalHeader | EntryType::XHeader) {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| InstallError::Extract(e.to_string()))?
            .into_owned();
        let Some(stripped) = strip_top_level(&path)? else {
            continue;
        };

        let target = root.join(&stripped);
        if let Some(parent) = target.parent() {
            ensure_inside(&root, parent, &path)?;
            fs::create_dir_all(parent)?;
        }

        match entry_type {
            EntryType::Symlink => {
                let link = link_name(&entry)?;
                if !link.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
                    return Err(escapes(&path));
                }
                entry.unpack(&target)?;
            }
            EntryType::Link => {
                let link = link_name(&entry)?;
                let Some(source) = strip_top_level(&link)? else {
                    return Err(escapes(&path));
                };
                let source = root.join(source);
                ensure_inside(&root, &source, &path)?;
                if fs::symlink_metadata(&target).is_ok() {
                    fs::remove_file(&target)?;
                }
                fs::hard_link(&source, &target)?;
            }
            _ => {
                entry.unpack(&target)?;
            }
        }
        unpacked += 1;
    }

    tracing::trace!("Unpacked {unpacked} entries into {}", dest.display());
    Ok(())
}

/// Drop the archive's top-level directory. `None` for the directory itself.
fn strip_top_level(path: &Path) -> Result<Option<PathBuf>, InstallError> {
    let stripped: PathBuf = path.components().skip(1).collect();
    if stripped.as_os_str().is_empty() {
        return Ok(None);
    }
    if !stripped.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(escapes(path));
    }
    Ok(Some(stripped))
}

fn link_name<R: std::io::Read>(entry: &tar::Entry<'_, R>) -> Result<PathBuf, InstallError> {
    entry
        .link_name()
        .map_err(|e| InstallError::Extract(e.to_string()))?
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| InstallError::Extract("link entry without a target".to_string()))
}

/// Fail unless the deepest existing ancestor of `path` resolves below `root`.
fn ensure_inside(root: &Path, path: &Path, entry: &Path) -> Result<(), InstallError> {
    let mut existing = path;
    while fs::symlink_metadata(existing).is_err() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return Err(escapes(entry)),
        }
    }
    if fs::canonicalize(existing)?.starts_with(root) {
        Ok(())
    } else {
        Err(escapes(entry))
    }
}

fn escapes(path: &Path) -> InstallError {
    InstallError::Extract(format!("entry escapes destination: {}", path.display()))
}
