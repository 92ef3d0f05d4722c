/*!
Manifest records linking multi-artifact saves to their concrete files.

A manifest is written beside the data files it describes
(`{base}_metadata.json`) and records, per artifact, the exact resolved path,
format, and generation time. Its lifetime is independent of the files it
references: loads fail per-artifact when a referenced file has gone missing.
Manifest entries are exact paths and are never re-resolved through
timestamp resolution.
*/

use crate::formats::FileFormat;
use crate::path::StoragePath;
use crate::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current manifest format version for compatibility tracking
pub const MANIFEST_FORMAT_VERSION: u8 = 1;

/// One artifact reference within a manifest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// Caller-chosen logical identifier of the artifact
    #[serde(rename = "artifact_name")]
    pub artifact: String,
    /// Exact resolved path of the stored file
    pub path: StoragePath,
    /// Format the artifact was encoded with
    pub extension: FileFormat,
    /// Generation time (ISO 8601)
    pub generated_at: DateTime<Utc>,
}

/// Side-car record for a multi-artifact save, preserving save order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Format version for compatibility (current: 1)
    pub format_version: u8,
    /// When the save that produced this manifest ran
    pub generated_at: DateTime<Utc>,
    /// Artifact references in save order
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            generated_at,
            entries: Vec::new(),
        }
    }

    /// Record one saved artifact.
    pub fn push(&mut self, artifact: impl Into<String>, path: StoragePath, extension: FileFormat) {
        self.entries.push(ManifestEntry {
            artifact: artifact.into(),
            path,
            extension,
            generated_at: self.generated_at,
        });
    }

    /// Artifact names in save order.
    pub fn artifact_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.artifact.as_str()).collect()
    }

    /// Check if this manifest is compatible with the current format version.
    pub fn is_compatible(&self) -> bool {
        self.format_version <= MANIFEST_FORMAT_VERSION
    }

    /// Serialize to the on-disk representation (pretty JSON, UTF-8).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse the on-disk representation, rejecting incompatible versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes)?;
        if !manifest.is_compatible() {
            return Err(StoreError::invalid_payload(format!(
                "incompatible manifest format version: {} (current: {MANIFEST_FORMAT_VERSION})",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }
}

/// Logical manifest file name for a multi-artifact save base name.
pub fn manifest_base_name(base: &str) -> String {
    format!("{base}_metadata")
}
