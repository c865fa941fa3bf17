//! Filesystem helpers with "already absent is fine" semantics

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Remove a file or directory tree.
///
/// A path that does not exist is not an error; any other OS error
/// propagates.
pub fn rm_rf(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    // symlink_metadata so a dangling symlink is removed, not followed.
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("cannot stat {}", path.display()));
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
    }
}

/// Unlink a single file, ignoring "not found".
pub fn safe_unlink(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("cannot unlink {}", path.display())),
    }
}

/// Create a directory and all missing parents. Idempotent.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).with_context(|| format!("cannot create directory {}", path.display()))
}

/// Ensure a file's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rm_rf_missing_path_is_ok() {
        let temp = tempdir().unwrap();
        rm_rf(temp.path().join("never-created")).unwrap();
    }

    #[test]
    fn test_rm_rf_removes_populated_tree() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("tree");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/file.txt"), "x").unwrap();
        fs::write(root.join("top.txt"), "y").unwrap();

        rm_rf(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_rm_rf_removes_single_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        rm_rf(&file).unwrap();
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_rm_rf_removes_dangling_symlink() {
        let temp = tempdir().unwrap();
        let link = temp.path().join("dangling");
        std::os::unix::fs::symlink(temp.path().join("gone"), &link).unwrap();

        rm_rf(&link).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
    }

    #[test]
    fn test_safe_unlink_missing_is_ok() {
        let temp = tempdir().unwrap();
        safe_unlink(temp.path().join("missing.txt")).unwrap();
    }

    #[test]
    fn test_safe_unlink_removes_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        safe_unlink(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a/b/c");

        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_ensure_parent_dir() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("x/y/file.txt");

        ensure_parent_dir(&file).unwrap();
        assert!(temp.path().join("x/y").is_dir());
        // Relative path with no parent is a no-op.
        ensure_parent_dir(Path::new("file.txt")).unwrap();
    }
}
