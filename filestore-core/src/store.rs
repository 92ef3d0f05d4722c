/*!
The persistence facade orchestrating path resolution, format dispatch,
timestamping, manifests, and the storage backend.

This is the primary interface of the core. A [`FileStore`] is constructed
once with a fixed backend choice and is stateless beyond that: every
operation resolves a path, picks a codec from the closed registry, and
moves bytes through the backend synchronously.
*/

use crate::config::{BackendKind, StoreConfig};
use crate::document::Document;
use crate::formats::{FileFormat, FormatRegistry};
use crate::manifest::{manifest_base_name, Manifest, ManifestEntry};
use crate::path::{self, find_project_root, Role, StoragePath};
use crate::storage::{LocalBackend, StorageBackend};
use crate::table::{Table, TabularPayload};
use crate::timestamp;
use crate::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

/// Options for save operations.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Optional subdirectory under the role directory
    pub sub_path: Option<String>,
    /// Place the role directory at the project root instead of the data dir
    pub root_level: bool,
    /// Override the configured timestamping default for this save
    pub timestamp: Option<bool>,
    /// Sheet label reported for single-table saves
    pub sheet_name: Option<String>,
}

impl SaveOptions {
    pub fn sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    pub fn timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = Some(enabled);
        self
    }

    pub fn root_level(mut self) -> Self {
        self.root_level = true;
        self
    }
}

/// Options for load operations.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Optional subdirectory under the role directory
    pub sub_path: Option<String>,
    /// The role directory lives at the project root instead of the data dir
    pub root_level: bool,
}

impl LoadOptions {
    pub fn sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    pub fn root_level(mut self) -> Self {
        self.root_level = true;
        self
    }
}

/// Locations produced by a save operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    /// Saved files keyed by artifact/sheet label, in save order
    pub files: Vec<(String, StoragePath)>,
    /// Manifest location for multi-artifact saves
    pub manifest: Option<StoragePath>,
}

impl SaveReceipt {
    /// Location of the single saved file, for single-artifact saves.
    pub fn single(&self) -> Option<&StoragePath> {
        match self.files.as_slice() {
            [(_, path)] => Some(path),
            _ => None,
        }
    }
}

/// The persistence facade.
///
/// Generic over the storage backend; `FileStore<Box<dyn StorageBackend>>`
/// (as produced by [`create_store_from_config`]) erases the choice for
/// hosts that pick the backend at runtime.
pub struct FileStore<S: StorageBackend> {
    backend: S,
    registry: FormatRegistry,
    include_timestamp: bool,
}

impl FileStore<LocalBackend> {
    /// Create a facade over the local filesystem backend.
    ///
    /// When `project_root` is not configured it is auto-detected by scanning
    /// upward for a project marker.
    pub fn local(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let root = match &config.project_root {
            Some(root) => root.clone(),
            None => find_project_root(None).ok_or_else(|| {
                StoreError::config(
                    "project root not configured and no project marker found upward of the working directory",
                )
            })?,
        };
        info!(root = %root.display(), "initialized local file store");
        Ok(FileStore::new(
            LocalBackend::new(root, config.layout.clone()),
            FormatRegistry::new(config.csv.clone()),
            config.include_timestamp,
        ))
    }
}

#[cfg(feature = "s3")]
impl FileStore<crate::storage::RemoteBackend> {
    /// Create a facade over the remote object-storage backend.
    ///
    /// Fails fast with `BackendUnavailable` when the client cannot be
    /// constructed; there is no silent fallback to local storage.
    pub fn remote(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let remote = config.remote.as_ref().ok_or_else(|| {
            StoreError::config("remote backend requires a 'remote' settings block")
        })?;
        Ok(FileStore::new(
            crate::storage::RemoteBackend::new(remote)?,
            FormatRegistry::new(config.csv.clone()),
            config.include_timestamp,
        ))
    }
}

/// Create a facade from configuration, choosing the backend at runtime.
///
/// Remote connectivity failures surface as `BackendUnavailable` rather than
/// silently degrading. Hosts wanting remote-then-local fallback perform it
/// explicitly:
///
/// ```rust,no_run
/// use filestore_core::{create_store_from_config, BackendKind, StoreConfig, StoreError};
///
/// let config = StoreConfig::from_yaml_file("filestore.yaml")?;
/// let store = match create_store_from_config(&config) {
///     Err(StoreError::BackendUnavailable(reason)) => {
///         eprintln!("remote storage unreachable ({reason}), using local");
///         let mut local = config.clone();
///         local.backend = BackendKind::Local;
///         create_store_from_config(&local)?
///     }
///     other => other?,
/// };
/// # Ok::<(), StoreError>(())
/// ```
pub fn create_store_from_config(
    config: &StoreConfig,
) -> Result<FileStore<Box<dyn StorageBackend>>> {
    config.validate()?;
    match config.backend {
        BackendKind::Local => {
            let store = FileStore::local(config)?;
            Ok(FileStore::new(
                Box::new(store.backend) as Box<dyn StorageBackend>,
                store.registry,
                store.include_timestamp,
            ))
        }
        #[cfg(feature = "s3")]
        BackendKind::Remote => {
            let store = FileStore::remote(config)?;
            Ok(FileStore::new(
                Box::new(store.backend) as Box<dyn StorageBackend>,
                store.registry,
                store.include_timestamp,
            ))
        }
        #[cfg(not(feature = "s3"))]
        BackendKind::Remote => Err(StoreError::config(
            "remote backend support is not compiled in (enable the 's3' feature)",
        )),
    }
}

impl<S: StorageBackend> FileStore<S> {
    /// Create a facade over an explicit backend.
    pub fn new(backend: S, registry: FormatRegistry, include_timestamp: bool) -> Self {
        Self {
            backend,
            registry,
            include_timestamp,
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn file_name_for(
        &self,
        base: &str,
        format: FileFormat,
        timestamp_override: Option<bool>,
        now: DateTime<Utc>,
    ) -> String {
        if timestamp_override.unwrap_or(self.include_timestamp) {
            timestamp::stamped_file_name(base, format, now)
        } else {
            timestamp::plain_file_name(base, format)
        }
    }

    /// Locate the concrete file for a logical name: the exact path when it
    /// exists, otherwise the newest timestamped variant in its directory.
    fn resolve_existing(&self, path: &StoragePath) -> Result<StoragePath> {
        if self.backend.exists(path) {
            return Ok(path.clone());
        }
        let listing = self.backend.list(&path.parent(), None)?;
        let concrete = timestamp::resolve(path.file_name(), &listing)?;
        debug!(logical = %path, concrete = %concrete, "resolved timestamped variant");
        Ok(path.with_file_name(&concrete))
    }

    /// Save tabular data under a directory role.
    ///
    /// A single table becomes one file. Multiple named tables become one
    /// multi-sheet file for workbook formats, or one file per name plus a
    /// manifest for everything else.
    pub fn save_data(
        &self,
        payload: impl Into<TabularPayload>,
        role: impl Into<Role>,
        name: &str,
        format: FileFormat,
        options: &SaveOptions,
    ) -> Result<SaveReceipt> {
        let role = role.into();
        let codec = self.registry.tabular(format)?;
        let now = Utc::now();

        match payload.into() {
            TabularPayload::Single(table) => {
                let file = self.file_name_for(name, format, options.timestamp, now);
                let path =
                    path::resolve(role, options.sub_path.as_deref(), &file, options.root_level)?;
                self.backend.write_bytes(&path, &codec.encode(&table)?)?;
                info!(path = %path, rows = table.n_rows(), "saved dataset");

                let label = options
                    .sheet_name
                    .clone()
                    .unwrap_or_else(|| "Sheet1".to_string());
                Ok(SaveReceipt {
                    files: vec![(label, path)],
                    manifest: None,
                })
            }
            TabularPayload::Many(sheets) => {
                if format.is_workbook() {
                    let file = self.file_name_for(name, format, options.timestamp, now);
                    let path = path::resolve(
                        role,
                        options.sub_path.as_deref(),
                        &file,
                        options.root_level,
                    )?;
                    self.backend
                        .write_bytes(&path, &codec.encode_workbook(&sheets)?)?;
                    info!(path = %path, sheets = sheets.len(), "saved workbook");
                    Ok(SaveReceipt {
                        files: vec![(name.to_string(), path)],
                        manifest: None,
                    })
                } else {
                    self.save_set(sheets, role, name, format, options, now)
                }
            }
        }
    }

    /// Save a set of named tables as one file per artifact plus a manifest
    /// that can later reconstruct the exact set.
    pub fn save_with_metadata(
        &self,
        tables: Vec<(String, Table)>,
        role: impl Into<Role>,
        name: &str,
        format: FileFormat,
        options: &SaveOptions,
    ) -> Result<SaveReceipt> {
        self.save_set(tables, role.into(), name, format, options, Utc::now())
    }

    fn save_set(
        &self,
        tables: Vec<(String, Table)>,
        role: Role,
        base: &str,
        format: FileFormat,
        options: &SaveOptions,
        now: DateTime<Utc>,
    ) -> Result<SaveReceipt> {
        if tables.is_empty() {
            return Err(StoreError::invalid_payload(
                "a multi-artifact save requires at least one named dataset",
            ));
        }
        let codec = self.registry.tabular(format)?;

        let mut manifest = Manifest::new(now);
        let mut files = Vec::with_capacity(tables.len());
        for (artifact, table) in &tables {
            let file = self.file_name_for(
                &format!("{base}_{artifact}"),
                format,
                options.timestamp,
                now,
            );
            let path = path::resolve(
                role.clone(),
                options.sub_path.as_deref(),
                &file,
                options.root_level,
            )?;
            self.backend.write_bytes(&path, &codec.encode(table)?)?;
            manifest.push(artifact.clone(), path.clone(), format);
            files.push((artifact.clone(), path));
        }

        let manifest_file = self.file_name_for(
            &manifest_base_name(base),
            FileFormat::Json,
            options.timestamp,
            now,
        );
        let manifest_path = path::resolve(
            role,
            options.sub_path.as_deref(),
            &manifest_file,
            options.root_level,
        )?;
        self.backend
            .write_bytes(&manifest_path, &manifest.to_bytes()?)?;
        info!(artifacts = files.len(), manifest = %manifest_path, "saved artifact set");

        Ok(SaveReceipt {
            files,
            manifest: Some(manifest_path),
        })
    }

    /// Load one table. The format is inferred from the name's extension and
    /// timestamped variants are resolved transparently.
    pub fn load_data(
        &self,
        role: impl Into<Role>,
        name: &str,
        options: &LoadOptions,
    ) -> Result<Table> {
        let format = FileFormat::from_file_name(name)?;
        let codec = self.registry.tabular(format)?;
        let path = path::resolve(
            role.into(),
            options.sub_path.as_deref(),
            name,
            options.root_level,
        )?;
        let concrete = self.resolve_existing(&path)?;
        codec.decode(&self.backend.read_bytes(&concrete)?)
    }

    /// Load every sheet of a workbook artifact, in workbook order.
    pub fn load_sheets(
        &self,
        role: impl Into<Role>,
        name: &str,
        options: &LoadOptions,
    ) -> Result<Vec<(String, Table)>> {
        let format = FileFormat::from_file_name(name)?;
        let codec = self.registry.tabular(format)?;
        let path = path::resolve(
            role.into(),
            options.sub_path.as_deref(),
            name,
            options.root_level,
        )?;
        let concrete = self.resolve_existing(&path)?;
        codec.decode_workbook(&self.backend.read_bytes(&concrete)?)
    }

    /// Load the artifact set a manifest describes.
    ///
    /// Manifest entries are exact paths and are never re-resolved. A
    /// missing or corrupt artifact yields an error for that key rather than
    /// aborting the whole load, so callers can inspect which artifacts
    /// succeeded.
    pub fn load_from_metadata(
        &self,
        role: impl Into<Role>,
        manifest_name: &str,
        options: &LoadOptions,
    ) -> Result<Vec<(String, Result<Table>)>> {
        let path = path::resolve(
            role.into(),
            options.sub_path.as_deref(),
            manifest_name,
            options.root_level,
        )?;
        let concrete = self.resolve_existing(&path)?;
        let manifest = Manifest::from_bytes(&self.backend.read_bytes(&concrete)?)?;

        let mut results = Vec::with_capacity(manifest.entries.len());
        for entry in &manifest.entries {
            let result = self.load_manifest_entry(entry);
            if let Err(e) = &result {
                warn!(artifact = %entry.artifact, path = %entry.path, error = %e,
                    "manifest artifact failed to load");
            }
            results.push((entry.artifact.clone(), result));
        }
        Ok(results)
    }

    fn load_manifest_entry(&self, entry: &ManifestEntry) -> Result<Table> {
        let codec = self.registry.tabular(entry.extension)?;
        codec.decode(&self.backend.read_bytes(&entry.path)?)
    }

    /// Save a document under a directory role.
    pub fn save_document(
        &self,
        document: &Document,
        role: impl Into<Role>,
        name: &str,
        format: FileFormat,
        options: &SaveOptions,
    ) -> Result<StoragePath> {
        let codec = self.registry.document(format)?;
        let now = Utc::now();
        let file = self.file_name_for(name, format, options.timestamp, now);
        let path = path::resolve(
            role.into(),
            options.sub_path.as_deref(),
            &file,
            options.root_level,
        )?;
        self.backend.write_bytes(&path, &codec.encode(document)?)?;
        info!(path = %path, "saved document");
        Ok(path)
    }

    /// Load a document. The format is inferred from the name's extension
    /// and timestamped variants are resolved transparently.
    pub fn load_document(
        &self,
        role: impl Into<Role>,
        name: &str,
        options: &LoadOptions,
    ) -> Result<Document> {
        let format = FileFormat::from_file_name(name)?;
        let codec = self.registry.document(format)?;
        let path = path::resolve(
            role.into(),
            options.sub_path.as_deref(),
            name,
            options.root_level,
        )?;
        let concrete = self.resolve_existing(&path)?;
        codec.decode(&self.backend.read_bytes(&concrete)?)
    }

    /// Whether an artifact exists at the exact resolved path. Never errors.
    pub fn exists(&self, role: impl Into<Role>, name: &str, options: &LoadOptions) -> bool {
        match path::resolve(
            role.into(),
            options.sub_path.as_deref(),
            name,
            options.root_level,
        ) {
            Ok(path) => self.backend.exists(&path),
            Err(e) => {
                debug!(name, error = %e, "existence check failed, treating as absent");
                false
            }
        }
    }

    /// Delete the artifact at the exact resolved path.
    pub fn delete(&self, role: impl Into<Role>, name: &str, options: &LoadOptions) -> Result<()> {
        let path = path::resolve(
            role.into(),
            options.sub_path.as_deref(),
            name,
            options.root_level,
        )?;
        self.backend.delete(&path)
    }

    /// Explode a workbook into one CSV per sheet plus a structure document
    /// recording sheet order, file names, and dimensions.
    pub fn convert_workbook_to_csv(
        &self,
        input_role: impl Into<Role>,
        workbook_name: &str,
        output_role: impl Into<Role>,
        base_name: Option<&str>,
        options: &SaveOptions,
    ) -> Result<(Vec<(String, StoragePath)>, StoragePath)> {
        let output_role = output_role.into();
        let sheets = self.load_sheets(input_role, workbook_name, &LoadOptions::default())?;
        if sheets.is_empty() {
            return Err(StoreError::invalid_payload(format!(
                "no sheets found in workbook '{workbook_name}'"
            )));
        }

        let base = base_name
            .map(str::to_string)
            .unwrap_or_else(|| stem_of(workbook_name).to_string());

        let mut csv_files = Vec::with_capacity(sheets.len());
        let mut sheet_info = serde_json::Map::new();
        for (sheet, table) in &sheets {
            let receipt = self.save_data(
                table.clone(),
                output_role.clone(),
                &format!("{base}_{sheet}"),
                FileFormat::Csv,
                options,
            )?;
            let path = receipt.single().cloned().ok_or_else(|| {
                StoreError::storage("single-table save produced no file location")
            })?;
            sheet_info.insert(
                sheet.clone(),
                json!({
                    "csv_file": path.to_string(),
                    "csv_filename": path.file_name(),
                    "dimensions": {"rows": table.n_rows(), "columns": table.n_cols()},
                    "columns": table.columns(),
                }),
            );
            csv_files.push((sheet.clone(), path));
        }

        let structure = json!({
            "workbook_info": {
                "source_file": workbook_name,
                "total_sheets": sheets.len(),
                "sheet_names": sheets.iter().map(|(n, _)| n.clone()).collect::<Vec<_>>(),
            },
            "sheets": serde_json::Value::Object(sheet_info),
        });
        let structure_path = self.save_document(
            &Document::Value(structure),
            output_role,
            &format!("{base}_structure"),
            FileFormat::Json,
            options,
        )?;

        info!(sheets = csv_files.len(), structure = %structure_path,
            "exploded workbook to CSV");
        Ok((csv_files, structure_path))
    }

    /// Rebuild a workbook from CSVs previously produced by
    /// [`FileStore::convert_workbook_to_csv`], using its structure document.
    ///
    /// Sheets whose CSV file has gone missing are skipped with a warning
    /// rather than aborting, as long as at least one sheet loads.
    pub fn rebuild_workbook_from_csv(
        &self,
        role: impl Into<Role>,
        structure_name: &str,
        output_role: impl Into<Role>,
        file_name: Option<&str>,
        options: &SaveOptions,
    ) -> Result<StoragePath> {
        let role = role.into();
        let document =
            self.load_document(role.clone(), structure_name, &LoadOptions::default())?;
        let Document::Value(structure) = document else {
            return Err(StoreError::invalid_payload(
                "structure document must be JSON content",
            ));
        };
        let sheet_map = structure
            .get("sheets")
            .and_then(|v| v.as_object())
            .ok_or_else(|| {
                StoreError::invalid_payload("structure document is missing 'sheets'")
            })?;

        // Sheet order comes from workbook_info when recorded.
        let order: Vec<String> = structure
            .pointer("/workbook_info/sheet_names")
            .and_then(|v| v.as_array())
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_else(|| sheet_map.keys().cloned().collect());

        let mut sheets: Vec<(String, Table)> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        for sheet in order {
            let Some(csv_filename) = sheet_map
                .get(&sheet)
                .and_then(|info| info.get("csv_filename"))
                .and_then(|v| v.as_str())
            else {
                warn!(sheet = %sheet, "no CSV file name recorded for sheet, skipping");
                continue;
            };
            match self.load_data(role.clone(), csv_filename, &LoadOptions::default()) {
                Ok(table) => sheets.push((sheet, table)),
                Err(e) => {
                    warn!(sheet = %sheet, csv_filename, error = %e, "failed to load sheet CSV");
                    missing.push(sheet);
                }
            }
        }
        if sheets.is_empty() {
            return Err(StoreError::storage(format!(
                "no sheet CSVs could be loaded (missing: {missing:?})"
            )));
        }

        let base = file_name.map(str::to_string).unwrap_or_else(|| {
            format!(
                "{}_rebuilt",
                stem_of(structure_name).trim_end_matches("_structure")
            )
        });
        let receipt = self.save_data(
            TabularPayload::Many(sheets),
            output_role,
            &base,
            FileFormat::Xlsx,
            options,
        )?;
        let path = receipt.single().cloned().ok_or_else(|| {
            StoreError::storage("workbook save produced no file location")
        })?;
        info!(path = %path, skipped = missing.len(), "rebuilt workbook from CSV");
        Ok(path)
    }
}

fn stem_of(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use crate::table::Cell;

    fn store() -> FileStore<MemoryBackend> {
        FileStore::new(MemoryBackend::new(), FormatRegistry::default(), true)
    }

    fn sample() -> Table {
        Table::with_rows(
            vec!["id", "name"],
            vec![
                vec![Cell::Int(1), Cell::from("ada")],
                vec![Cell::Int(2), Cell::from("grace")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn save_and_load_without_timestamp() {
        let store = store();
        let receipt = store
            .save_data(
                sample(),
                "processed",
                "people",
                FileFormat::Csv,
                &SaveOptions::default().timestamp(false),
            )
            .unwrap();
        assert_eq!(
            receipt.single().unwrap().to_string(),
            "processed/people.csv"
        );

        let loaded = store
            .load_data("processed", "people.csv", &LoadOptions::default())
            .unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn timestamped_save_resolves_on_load() {
        let store = store();
        let receipt = store
            .save_data(
                sample(),
                "processed",
                "people",
                FileFormat::Json,
                &SaveOptions::default(),
            )
            .unwrap();
        let concrete = receipt.single().unwrap().file_name().to_string();
        assert_ne!(concrete, "people.json");
        assert!(concrete.starts_with("people_"));

        // The logical name finds the timestamped file.
        let loaded = store
            .load_data("processed", "people.json", &LoadOptions::default())
            .unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn newest_variant_wins_but_exact_name_takes_precedence() {
        let store = store();
        let old = StoragePath::new("raw", "report_20240101_000000.json");
        let new = StoragePath::new("raw", "report_20240601_000000.json");
        store
            .backend
            .write_bytes(&old, br#"[{"v": 1}]"#)
            .unwrap();
        store
            .backend
            .write_bytes(&new, br#"[{"v": 2}]"#)
            .unwrap();

        let loaded = store
            .load_data("raw", "report.json", &LoadOptions::default())
            .unwrap();
        assert_eq!(loaded.rows()[0][0], Cell::Int(2));

        // An exact file beats every timestamped variant.
        let exact = StoragePath::new("raw", "report.json");
        store
            .backend
            .write_bytes(&exact, br#"[{"v": 3}]"#)
            .unwrap();
        let loaded = store
            .load_data("raw", "report.json", &LoadOptions::default())
            .unwrap();
        assert_eq!(loaded.rows()[0][0], Cell::Int(3));
    }

    #[test]
    fn many_with_workbook_format_writes_one_file() {
        let store = store();
        let receipt = store
            .save_data(
                vec![
                    ("first".to_string(), sample()),
                    ("second".to_string(), sample()),
                ],
                "processed",
                "book",
                FileFormat::Xlsx,
                &SaveOptions::default().timestamp(false),
            )
            .unwrap();
        assert!(receipt.manifest.is_none());
        assert_eq!(receipt.files.len(), 1);

        let sheets = store
            .load_sheets("processed", "book.xlsx", &LoadOptions::default())
            .unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].0, "first");
    }

    #[test]
    fn many_with_flat_format_writes_manifest() {
        let store = store();
        let receipt = store
            .save_data(
                vec![
                    ("a".to_string(), sample()),
                    ("b".to_string(), sample()),
                ],
                "processed",
                "split",
                FileFormat::Csv,
                &SaveOptions::default().timestamp(false),
            )
            .unwrap();
        let manifest_path = receipt.manifest.clone().unwrap();
        assert_eq!(manifest_path.to_string(), "processed/split_metadata.json");
        assert_eq!(receipt.files[0].1.to_string(), "processed/split_a.csv");

        let results = store
            .load_from_metadata("processed", "split_metadata.json", &LoadOptions::default())
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
    }

    #[test]
    fn partial_failure_isolated_per_artifact() {
        let store = store();
        store
            .save_with_metadata(
                vec![
                    ("a".to_string(), sample()),
                    ("b".to_string(), sample()),
                ],
                "processed",
                "split",
                FileFormat::Csv,
                &SaveOptions::default().timestamp(false),
            )
            .unwrap();

        store
            .backend
            .delete(&StoragePath::new("processed", "split_b.csv"))
            .unwrap();

        let results = store
            .load_from_metadata("processed", "split_metadata.json", &LoadOptions::default())
            .unwrap();
        let by_name: std::collections::HashMap<_, _> = results
            .iter()
            .map(|(name, result)| (name.as_str(), result))
            .collect();
        assert!(by_name["a"].is_ok());
        assert!(by_name["b"].as_ref().unwrap_err().is_not_found());
    }

    #[test]
    fn sub_path_ambiguity_rejected() {
        let store = store();
        let err = store
            .load_data(
                "raw",
                "dir/file.csv",
                &LoadOptions::default().sub_path("sub"),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn unsupported_kind_format_pair() {
        let store = store();
        let err = store
            .save_data(
                sample(),
                "processed",
                "doc",
                FileFormat::Docx,
                &SaveOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFormat { .. }));
    }

    #[test]
    fn document_roundtrip_through_store() {
        let store = store();
        let doc = Document::Value(serde_json::json!({"threshold": 0.5}));
        store
            .save_document(
                &doc,
                "configurations",
                "params",
                FileFormat::Json,
                &SaveOptions::default().timestamp(false),
            )
            .unwrap();
        let loaded = store
            .load_document("configurations", "params.json", &LoadOptions::default())
            .unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn workbook_explode_and_rebuild() {
        let store = store();
        store
            .save_data(
                vec![
                    ("alpha".to_string(), sample()),
                    ("beta".to_string(), sample()),
                ],
                "raw",
                "book",
                FileFormat::Xlsx,
                &SaveOptions::default().timestamp(false),
            )
            .unwrap();

        let no_ts = SaveOptions::default().timestamp(false);
        let (csv_files, structure) = store
            .convert_workbook_to_csv("raw", "book.xlsx", "processed", None, &no_ts)
            .unwrap();
        assert_eq!(csv_files.len(), 2);
        assert_eq!(structure.to_string(), "processed/book_structure.json");

        let rebuilt = store
            .rebuild_workbook_from_csv(
                "processed",
                "book_structure.json",
                "processed",
                None,
                &no_ts,
            )
            .unwrap();
        let sheets = store
            .load_sheets("processed", rebuilt.file_name(), &LoadOptions::default())
            .unwrap();
        assert_eq!(
            sheets.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            vec!["alpha", "beta"]
        );
        assert_eq!(sheets[0].1, sample());
    }

    #[test]
    fn rebuild_skips_missing_sheets() {
        let store = store();
        let no_ts = SaveOptions::default().timestamp(false);
        store
            .save_data(
                vec![
                    ("alpha".to_string(), sample()),
                    ("beta".to_string(), sample()),
                ],
                "raw",
                "book",
                FileFormat::Xlsx,
                &no_ts,
            )
            .unwrap();
        store
            .convert_workbook_to_csv("raw", "book.xlsx", "processed", None, &no_ts)
            .unwrap();

        store
            .backend
            .delete(&StoragePath::new("processed", "book_beta.csv"))
            .unwrap();

        let rebuilt = store
            .rebuild_workbook_from_csv(
                "processed",
                "book_structure.json",
                "processed",
                None,
                &no_ts,
            )
            .unwrap();
        let sheets = store
            .load_sheets("processed", rebuilt.file_name(), &LoadOptions::default())
            .unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].0, "alpha");
    }
}
