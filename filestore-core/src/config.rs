//! Configuration module for storage backend selection and settings
//!
//! An immutable [`StoreConfig`] value is passed into the facade constructor;
//! there is no process-wide configuration state. Configurations are plain
//! serde structures and can be loaded from a YAML file.

use crate::path::{Role, StoragePath};
use crate::{Result, StoreError};
use filestore_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Enumeration of supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local filesystem storage
    Local,
    /// Remote object storage
    Remote,
}

/// CSV codec settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Delimiter written on save and used as the inference fallback on load.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ';'
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

/// Mapping from directory roles to on-disk directory names.
///
/// Data-tier roles live under `{project_root}/{data_dir}/{dir}`; root-level
/// paths skip the data directory. Role-to-directory names are configuration,
/// not hard-coded: unmapped roles fall back to the role name itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLayout {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_role_dirs")]
    pub roles: HashMap<String, String>,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_role_dirs() -> HashMap<String, String> {
    ["raw", "interim", "processed", "configurations", "templates"]
        .into_iter()
        .map(|name| (name.to_string(), name.to_string()))
        .collect()
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            roles: default_role_dirs(),
        }
    }
}

impl DirectoryLayout {
    /// Directory name configured for a role, defaulting to the role name.
    pub fn dir_for<'a>(&'a self, role: &'a Role) -> &'a str {
        self.roles
            .get(role.as_str())
            .map(String::as_str)
            .unwrap_or_else(|| role.as_str())
    }

    /// Project-root-relative filesystem path for a resolved storage path.
    pub fn fs_path(&self, path: &StoragePath) -> PathBuf {
        let mut fs = PathBuf::new();
        if !path.root_level {
            fs.push(&self.data_dir);
        }
        fs.push(self.dir_for(&path.role));
        if !path.relative.is_empty() {
            for segment in path.relative.split('/') {
                fs.push(segment);
            }
        }
        fs
    }
}

/// Remote object-storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Role-to-container mapping; unmapped roles fail at first use.
    pub container_mapping: HashMap<String, String>,
    /// Region override (optional, defaults to the environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Retry policy for transient-class failures.
    #[serde(default, rename = "retry_settings")]
    pub retry: RetryPolicy,
}

/// Configuration structure for the persistence facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// The storage backend to use
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Project root for local storage (auto-detected when omitted)
    #[serde(default)]
    pub project_root: Option<PathBuf>,
    /// Directory layout for local storage
    #[serde(default)]
    pub layout: DirectoryLayout,
    /// CSV codec settings
    #[serde(default)]
    pub csv: CsvOptions,
    /// Whether saves embed a generation timestamp in the file name by default
    #[serde(default = "default_include_timestamp")]
    pub include_timestamp: bool,
    /// Remote backend settings (required for the remote backend)
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

fn default_backend() -> BackendKind {
    BackendKind::Local
}

fn default_include_timestamp() -> bool {
    true
}

impl StoreConfig {
    /// Create a default configuration for local filesystem storage
    pub fn default_local() -> Self {
        StoreConfig {
            backend: BackendKind::Local,
            project_root: None,
            layout: DirectoryLayout::default(),
            csv: CsvOptions::default(),
            include_timestamp: default_include_timestamp(),
            remote: None,
        }
    }

    /// Create a local configuration rooted at the given directory
    pub fn local_at<P: AsRef<Path>>(project_root: P) -> Self {
        StoreConfig {
            project_root: Some(project_root.as_ref().to_path_buf()),
            ..Self::default_local()
        }
    }

    /// Create a remote configuration with the given role-to-container mapping
    pub fn remote_with_mapping(container_mapping: HashMap<String, String>) -> Self {
        StoreConfig {
            backend: BackendKind::Remote,
            remote: Some(RemoteConfig {
                container_mapping,
                region: None,
                retry: RetryPolicy::default(),
            }),
            ..Self::default_local()
        }
    }

    /// Load a configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: StoreConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.layout.data_dir.is_empty() {
            return Err(StoreError::config("data_dir must not be empty"));
        }
        if !self.csv.delimiter.is_ascii() {
            return Err(StoreError::config(format!(
                "csv delimiter '{}' must be a single ASCII character",
                self.csv.delimiter
            )));
        }
        if self.backend == BackendKind::Remote {
            let remote = self.remote.as_ref().ok_or_else(|| {
                StoreError::config("remote backend requires a 'remote' settings block")
            })?;
            if remote.container_mapping.is_empty() {
                return Err(StoreError::config(
                    "remote backend requires a non-empty container_mapping",
                ));
            }
            if remote
                .container_mapping
                .values()
                .any(|name| name.is_empty())
            {
                return Err(StoreError::config("container names must not be empty"));
            }
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::default_local()
    }
}
