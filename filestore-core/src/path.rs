/*!
Logical path model and pure path resolution.

A [`StoragePath`] is the backend-neutral address of a stored artifact: a
directory role plus a role-relative file path. Both storage backends
interpret the same `StoragePath` (the local backend through its directory
layout, the remote backend through its container mapping), so callers never
handle raw filesystem paths or bucket keys.
*/

use crate::{Result, StoreError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Logical storage location tag, mapped to a physical directory or container
/// by backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Raw,
    Interim,
    Processed,
    Configurations,
    Templates,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Raw => "raw",
            Role::Interim => "interim",
            Role::Processed => "processed",
            Role::Configurations => "configurations",
            Role::Templates => "templates",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "raw" => Role::Raw,
            "interim" => Role::Interim,
            "processed" => Role::Processed,
            "configurations" => Role::Configurations,
            "templates" => Role::Templates,
            other => Role::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from(s.as_str()))
    }
}

/// Backend-neutral resolved path: role, root-level flag, and the
/// role-relative file path using `/` separators.
///
/// Renders as `role/sub/file.ext`; root-level paths render with a leading
/// `/` (`/configurations/settings.yaml`). The rendering round-trips through
/// `FromStr`, which is what manifest entries store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    pub role: Role,
    pub root_level: bool,
    pub relative: String,
}

impl StoragePath {
    pub fn new<R: Into<Role>>(role: R, relative: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            root_level: false,
            relative: relative.into(),
        }
    }

    pub fn root_level<R: Into<Role>>(role: R, relative: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            root_level: true,
            relative: relative.into(),
        }
    }

    /// Final path segment (the file name), or the empty string for a bare
    /// role prefix.
    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or("")
    }

    /// The containing directory of this path, as a listing prefix.
    pub fn parent(&self) -> StoragePath {
        let dir = match self.relative.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        StoragePath {
            role: self.role.clone(),
            root_level: self.root_level,
            relative: dir,
        }
    }

    /// Same location with the final segment replaced.
    pub fn with_file_name(&self, name: &str) -> StoragePath {
        let relative = match self.relative.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{name}"),
            None => name.to_string(),
        };
        StoragePath {
            role: self.role.clone(),
            root_level: self.root_level,
            relative,
        }
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.root_level { "/" } else { "" };
        if self.relative.is_empty() {
            write!(f, "{prefix}{}", self.role)
        } else {
            write!(f, "{prefix}{}/{}", self.role, self.relative)
        }
    }
}

impl FromStr for StoragePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let (root_level, rest) = match s.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (role, relative) = match rest.split_once('/') {
            Some((role, relative)) => (role, relative.to_string()),
            None => (rest, String::new()),
        };
        if role.is_empty() {
            return Err(StoreError::config(format!("empty role in path '{s}'")));
        }
        Ok(StoragePath {
            role: Role::from(role),
            root_level,
            relative,
        })
    }
}

impl Serialize for StoragePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StoragePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn has_separator(s: &str) -> bool {
    s.contains('/') || s.contains('\\')
}

/// Normalize a sub-path to a relative `/`-separated string.
fn clean_sub_path(sub_path: &str) -> String {
    sub_path
        .replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Compute the backend-relative path for a file under a directory role.
///
/// `file_name` may itself carry directory components only when `sub_path` is
/// omitted; supplying both is ambiguous and rejected outright rather than
/// silently concatenated. Pure path arithmetic: no directories are created
/// or checked here.
pub fn resolve(
    role: Role,
    sub_path: Option<&str>,
    file_name: &str,
    root_level: bool,
) -> Result<StoragePath> {
    if file_name.is_empty() {
        return Err(StoreError::config("file name must not be empty"));
    }

    let relative = match sub_path {
        Some(sub) => {
            if has_separator(file_name) {
                return Err(StoreError::config(format!(
                    "cannot provide sub_path ('{sub}') when file name ('{file_name}') \
                     already contains directory separators"
                )));
            }
            let sub = clean_sub_path(sub);
            if sub.is_empty() {
                file_name.to_string()
            } else {
                format!("{sub}/{file_name}")
            }
        }
        None => clean_sub_path(file_name),
    };

    Ok(StoragePath {
        role,
        root_level,
        relative,
    })
}

/// Find the project root by scanning upwards for common indicators.
///
/// Indicators: `.git`, `Cargo.toml`, `pyproject.toml`, `environment.yaml`.
pub fn find_project_root(start_dir: Option<&Path>) -> Option<PathBuf> {
    let start = match start_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let indicators = [".git", "Cargo.toml", "pyproject.toml", "environment.yaml"];

    let mut current = start.as_path();
    loop {
        if indicators.iter().any(|i| current.join(i).exists()) {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_plain_file() {
        let path = resolve(Role::Processed, None, "report.csv", false).unwrap();
        assert_eq!(path.to_string(), "processed/report.csv");
        assert_eq!(path.file_name(), "report.csv");
        assert_eq!(path.parent().to_string(), "processed");
    }

    #[test]
    fn resolve_with_sub_path() {
        let path = resolve(Role::Raw, Some("2024/q1"), "sales.parquet", false).unwrap();
        assert_eq!(path.to_string(), "raw/2024/q1/sales.parquet");
        assert_eq!(path.parent().to_string(), "raw/2024/q1");
    }

    #[test]
    fn resolve_root_level() {
        let path = resolve(Role::Configurations, None, "settings.yaml", true).unwrap();
        assert!(path.root_level);
        assert_eq!(path.to_string(), "/configurations/settings.yaml");
    }

    #[test]
    fn ambiguous_sub_path_rejected() {
        let err = resolve(Role::Raw, Some("sub"), "dir/file.csv", false).unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));

        let err = resolve(Role::Raw, Some("sub"), "dir\\file.csv", false).unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn file_name_may_carry_directories_without_sub_path() {
        let path = resolve(Role::Raw, None, "nested/dir/file.csv", false).unwrap();
        assert_eq!(path.relative, "nested/dir/file.csv");
        assert_eq!(path.file_name(), "file.csv");
    }

    #[test]
    fn absolute_sub_path_is_made_relative() {
        let path = resolve(Role::Raw, Some("/abs/sub/"), "f.json", false).unwrap();
        assert_eq!(path.relative, "abs/sub/f.json");
    }

    #[test]
    fn display_from_str_roundtrip() {
        for s in ["raw/a/b.csv", "/configurations/settings.yaml", "processed/x.json"] {
            let path: StoragePath = s.parse().unwrap();
            assert_eq!(path.to_string(), s);
        }
    }

    #[test]
    fn with_file_name_replaces_last_segment() {
        let path: StoragePath = "raw/sub/report.csv".parse().unwrap();
        let renamed = path.with_file_name("report_20240101_120000.csv");
        assert_eq!(renamed.to_string(), "raw/sub/report_20240101_120000.csv");
    }

    #[test]
    fn custom_role_roundtrip() {
        let path: StoragePath = "models/trained.parquet".parse().unwrap();
        assert_eq!(path.role, Role::Other("models".to_string()));
        assert_eq!(path.role.as_str(), "models");
    }
}
