/*!
Local filesystem storage backend.
*/

use super::{matches_pattern, StorageBackend};
use crate::config::DirectoryLayout;
use crate::path::StoragePath;
use crate::{Result, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem backend rooted at a project directory.
///
/// Resolved paths map to
/// `{root}/{data_dir}/{role_dir}/{relative}` (or `{root}/{role_dir}/...`
/// for root-level paths) through the configured directory layout. Parent
/// directories are created lazily on the write path.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    layout: DirectoryLayout,
}

impl LocalBackend {
    pub fn new<P: AsRef<Path>>(root: P, layout: DirectoryLayout) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem path for a resolved storage path.
    pub fn fs_path(&self, path: &StoragePath) -> PathBuf {
        self.root.join(self.layout.fs_path(path))
    }

    fn ensure_parent_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::storage(format!(
                        "failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(())
    }
}

impl StorageBackend for LocalBackend {
    fn write_bytes(&self, path: &StoragePath, data: &[u8]) -> Result<()> {
        let full_path = self.fs_path(path);
        self.ensure_parent_dir(&full_path)?;
        fs::write(&full_path, data).map_err(|e| {
            StoreError::storage(format!(
                "failed to write {}: {e}",
                full_path.display()
            ))
        })?;
        debug!(path = %path, size = data.len(), "wrote file");
        Ok(())
    }

    fn read_bytes(&self, path: &StoragePath) -> Result<Vec<u8>> {
        let full_path = self.fs_path(path);
        fs::read(&full_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::not_found(path.to_string()),
            _ => StoreError::storage(format!(
                "failed to read {}: {e}",
                full_path.display()
            )),
        })
    }

    fn exists(&self, path: &StoragePath) -> bool {
        let full_path = self.fs_path(path);
        match full_path.try_exists() {
            Ok(exists) => exists && full_path.is_file(),
            Err(e) => {
                debug!(path = %path, error = %e, "existence check failed, treating as absent");
                false
            }
        }
    }

    fn list(&self, prefix: &StoragePath, pattern: Option<&str>) -> Result<Vec<String>> {
        let dir = self.fs_path(prefix);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::storage(format!(
                    "failed to list {}: {e}",
                    dir.display()
                )))
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                StoreError::storage(format!("failed to list {}: {e}", dir.display()))
            })?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if pattern.map_or(true, |p| matches_pattern(&name, p)) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, path: &StoragePath) -> Result<()> {
        let full_path = self.fs_path(path);
        if full_path.exists() {
            fs::remove_file(&full_path).map_err(|e| {
                StoreError::storage(format!(
                    "failed to delete {}: {e}",
                    full_path.display()
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend() -> (TempDir, LocalBackend) {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path(), DirectoryLayout::default());
        (temp_dir, backend)
    }

    #[test]
    fn basic_operations() {
        let (_guard, backend) = backend();
        let path = StoragePath::new("raw", "test.csv");

        backend.write_bytes(&path, b"a;b\n1;2\n").unwrap();
        assert!(backend.exists(&path));
        assert_eq!(backend.read_bytes(&path).unwrap(), b"a;b\n1;2\n");

        backend.delete(&path).unwrap();
        assert!(!backend.exists(&path));
    }

    #[test]
    fn parent_directories_created_lazily() {
        let (guard, backend) = backend();
        let path = StoragePath::new("processed", "2024/q1/out.json");

        backend.write_bytes(&path, b"[]").unwrap();
        assert!(guard
            .path()
            .join("data/processed/2024/q1/out.json")
            .is_file());
    }

    #[test]
    fn root_level_paths_skip_data_dir() {
        let (guard, backend) = backend();
        let path = StoragePath::root_level("configurations", "app.yaml");

        backend.write_bytes(&path, b"x: 1\n").unwrap();
        assert!(guard.path().join("configurations/app.yaml").is_file());
        assert!(!guard.path().join("data").exists());
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let (_guard, backend) = backend();
        let err = backend
            .read_bytes(&StoragePath::new("raw", "absent.csv"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn exists_never_errors() {
        let (_guard, backend) = backend();
        // A path whose parent is a regular file cannot be stat'ed cleanly.
        let file = StoragePath::new("raw", "plain.txt");
        backend.write_bytes(&file, b"data").unwrap();
        let nested = StoragePath::new("raw", "plain.txt/child.txt");
        assert!(!backend.exists(&nested));
    }

    #[test]
    fn listing_is_sorted_filtered_and_shallow() {
        let (_guard, backend) = backend();
        for name in ["b.csv", "a.csv", "a.json", "sub/c.csv"] {
            backend
                .write_bytes(&StoragePath::new("raw", name), b"x")
                .unwrap();
        }

        let prefix = StoragePath::new("raw", "");
        let all = backend.list(&prefix, None).unwrap();
        assert_eq!(all, vec!["a.csv", "a.json", "b.csv"]);

        let csvs = backend.list(&prefix, Some("*.csv")).unwrap();
        assert_eq!(csvs, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn missing_prefix_lists_empty() {
        let (_guard, backend) = backend();
        let names = backend
            .list(&StoragePath::new("raw", "nope"), None)
            .unwrap();
        assert!(names.is_empty());
    }
}
