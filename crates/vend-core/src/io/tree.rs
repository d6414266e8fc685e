//! Directory copy and content checksums.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Recursively copy the contents of `source` into `target`, creating
/// `target` if needed. Symlinks are recreated, not followed, on unix.
///
/// # Errors
///
/// Returns any IO error hit while walking or copying.
pub fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let dest = target.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(link)?;
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(link, dest).map(|_| ())
}

/// SHA-256 over every entry below `root`, in file-name order.
///
/// Each file contributes its relative path and its bytes; each symlink its
/// relative path and link target. Directories only contribute through the
/// entries they contain. Returned as lowercase hex.
///
/// # Errors
///
/// Returns any IO error hit while walking or reading.
pub fn checksum(root: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(io::Error::other)?;
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);

        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            hasher.update(target.to_string_lossy().as_bytes());
        } else {
            let mut file = fs::File::open(entry.path())?;
            loop {
                let count = file.read(&mut buffer)?;
                if count == 0 {
                    break;
                }
                hasher.update(&buffer[..count]);
            }
        }
        hasher.update([0u8]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("lib/nested")).unwrap();
        fs::write(root.join("main.libsonnet"), "{ a: 1 }").unwrap();
        fs::write(root.join("lib/nested/util.libsonnet"), "{}").unwrap();
    }

    #[test]
    fn test_copy_tree() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src");
        let target = dir.path().join("dst/deep");
        populate(&source);

        copy_tree(&source, &target).unwrap();
        assert_eq!(
            fs::read_to_string(target.join("main.libsonnet")).unwrap(),
            "{ a: 1 }"
        );
        assert!(target.join("lib/nested/util.libsonnet").is_file());
    }

    #[test]
    fn test_checksum_tracks_content_and_layout() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        populate(&a);
        populate(&b);

        let sum = checksum(&a).unwrap();
        assert_eq!(sum.len(), 64);
        assert_eq!(sum, checksum(&b).unwrap());

        fs::write(b.join("main.libsonnet"), "{ a: 2 }").unwrap();
        assert_ne!(sum, checksum(&b).unwrap());

        fs::rename(a.join("main.libsonnet"), a.join("renamed.libsonnet")).unwrap();
        assert_ne!(sum, checksum(&a).unwrap());
    }
}
