/*!
Storage backends for artifact persistence.

This module defines the storage abstraction (port) and concrete
implementations (adapters). The core engine works against
[`StorageBackend`] only, so local filesystem and remote object storage
behave identically from the caller's point of view: same path semantics,
same existence checks, same listing behavior.
*/

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use crate::path::StoragePath;
use crate::Result;

/// Storage abstraction all backends implement.
///
/// Paths are backend-neutral [`StoragePath`] values; each implementation
/// maps them to its physical namespace (directory layout or container
/// mapping).
pub trait StorageBackend: Send + Sync {
    /// Store content at the given location, creating any missing parent
    /// directories or containers. Overwrites silently if the exact path
    /// already exists; callers rely on timestamping to avoid unintended
    /// overwrite.
    fn write_bytes(&self, path: &StoragePath, data: &[u8]) -> Result<()>;

    /// Load the content at the given location. Fails with `NotFound` if
    /// absent.
    fn read_bytes(&self, path: &StoragePath) -> Result<Vec<u8>>;

    /// Whether a file exists at the given location.
    ///
    /// Never errors: any underlying failure is logged at debug level and
    /// reported as "does not exist", so the check is safe in conditionals.
    fn exists(&self, path: &StoragePath) -> bool;

    /// Names of the files directly under the given prefix, sorted,
    /// optionally filtered by a `*`-wildcard pattern. A missing prefix
    /// yields an empty listing, not an error. Non-recursive.
    fn list(&self, prefix: &StoragePath, pattern: Option<&str>) -> Result<Vec<String>>;

    /// Remove the file at the given location, if present.
    fn delete(&self, path: &StoragePath) -> Result<()>;
}

impl StorageBackend for Box<dyn StorageBackend> {
    fn write_bytes(&self, path: &StoragePath, data: &[u8]) -> Result<()> {
        (**self).write_bytes(path, data)
    }

    fn read_bytes(&self, path: &StoragePath) -> Result<Vec<u8>> {
        (**self).read_bytes(path)
    }

    fn exists(&self, path: &StoragePath) -> bool {
        (**self).exists(path)
    }

    fn list(&self, prefix: &StoragePath, pattern: Option<&str>) -> Result<Vec<String>> {
        (**self).list(prefix, pattern)
    }

    fn delete(&self, path: &StoragePath) -> Result<()> {
        (**self).delete(path)
    }
}

/// Match a file name against a listing pattern where `*` matches any run of
/// characters.
pub(crate) fn matches_pattern(name: &str, pattern: &str) -> bool {
    let mut segments = pattern.split('*');
    let first = segments.next().unwrap_or("");
    if !name.starts_with(first) {
        return false;
    }
    let mut rest = &name[first.len()..];
    let mut last_segment: Option<&str> = None;
    for segment in segments {
        last_segment = Some(segment);
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(index) => rest = &rest[index + segment.len()..],
            None => return false,
        }
    }
    match last_segment {
        // No wildcard at all: the whole name must have matched.
        None => rest.is_empty(),
        Some("") => true,
        Some(segment) => name.ends_with(segment),
    }
}

// Re-export types for convenience
pub use local::LocalBackend;
#[cfg(feature = "s3")]
pub use s3::RemoteBackend;

/// Memory-based storage backend for testing
///
/// Stores content in a HashMap keyed by the rendered path. Useful for unit
/// testing without touching the filesystem.
#[cfg(test)]
pub struct MemoryBackend {
    data: std::sync::Mutex<std::collections::BTreeMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: std::sync::Mutex::new(std::collections::BTreeMap::new()),
        }
    }
}

#[cfg(test)]
impl StorageBackend for MemoryBackend {
    fn write_bytes(&self, path: &StoragePath, data: &[u8]) -> Result<()> {
        let mut storage = self.data.lock().unwrap();
        storage.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn read_bytes(&self, path: &StoragePath) -> Result<Vec<u8>> {
        let storage = self.data.lock().unwrap();
        storage
            .get(&path.to_string())
            .cloned()
            .ok_or_else(|| crate::StoreError::not_found(path.to_string()))
    }

    fn exists(&self, path: &StoragePath) -> bool {
        let storage = self.data.lock().unwrap();
        storage.contains_key(&path.to_string())
    }

    fn list(&self, prefix: &StoragePath, pattern: Option<&str>) -> Result<Vec<String>> {
        let storage = self.data.lock().unwrap();
        let dir = format!("{prefix}/");
        let mut names: Vec<String> = storage
            .keys()
            .filter_map(|key| key.strip_prefix(&dir))
            .filter(|rest| !rest.contains('/'))
            .filter(|name| pattern.map_or(true, |p| matches_pattern(name, p)))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    fn delete(&self, path: &StoragePath) -> Result<()> {
        let mut storage = self.data.lock().unwrap();
        storage.remove(&path.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_basic_operations() {
        let backend = MemoryBackend::new();
        let path = StoragePath::new("raw", "test.csv");

        assert!(backend.write_bytes(&path, b"content").is_ok());
        assert!(backend.exists(&path));
        assert_eq!(backend.read_bytes(&path).unwrap(), b"content");

        assert!(backend.delete(&path).is_ok());
        assert!(!backend.exists(&path));
        assert!(backend.read_bytes(&path).unwrap_err().is_not_found());
    }

    #[test]
    fn memory_backend_listing_is_non_recursive() {
        let backend = MemoryBackend::new();
        backend
            .write_bytes(&StoragePath::new("raw", "a.csv"), b"1")
            .unwrap();
        backend
            .write_bytes(&StoragePath::new("raw", "b.csv"), b"2")
            .unwrap();
        backend
            .write_bytes(&StoragePath::new("raw", "nested/c.csv"), b"3")
            .unwrap();

        let names = backend.list(&StoragePath::new("raw", ""), None).unwrap();
        assert_eq!(names, vec!["a.csv".to_string(), "b.csv".to_string()]);
    }

    #[test]
    fn pattern_matching() {
        assert!(matches_pattern("report_20240101_000000.csv", "report_*.csv"));
        assert!(matches_pattern("report.csv", "report.csv"));
        assert!(!matches_pattern("report.csv", "report_*.csv"));
        assert!(!matches_pattern("other.csv", "report*"));
        assert!(matches_pattern("report.json", "*.json"));
        assert!(!matches_pattern("report.json.bak", "*.json"));
    }
}
