/*!
# FileStore Core Engine

Storage-abstraction and format-dispatch persistence layer.

This crate lets callers save and load structured data (tabular datasets and
rich documents) without knowing whether the bytes live on a local
filesystem or in remote object storage, and without hand-writing per-format
serialization:

- Pluggable storage backends behind one trait (local filesystem, S3)
- A closed codec registry keyed by (kind, file format)
- Timestamped versioning with transparent best-effort resolution on load
- Manifest-linked multi-artifact saves with per-artifact failure isolation

## Architecture

The core follows hexagonal architecture principles: path resolution and
format dispatch are pure domain logic, storage is an adapter seam, and the
[`FileStore`] facade wires them together with a fixed backend choice made
once at construction.

## Usage

```rust,no_run
use filestore_core::{
    Cell, FileFormat, FileStore, LoadOptions, SaveOptions, StoreConfig, Table,
};

let config = StoreConfig::local_at("/srv/project");
let store = FileStore::local(&config)?;

let table = Table::with_rows(
    vec!["id", "name"],
    vec![
        vec![Cell::Int(1), Cell::from("ada")],
        vec![Cell::Int(2), Cell::from("grace")],
    ],
)?;

// Saves are timestamped by default...
store.save_data(table, "processed", "people", FileFormat::Csv, &SaveOptions::default())?;

// ...and loads resolve the newest variant from the logical name.
let people = store.load_data("processed", "people.csv", &LoadOptions::default())?;
assert_eq!(people.n_rows(), 2);
# Ok::<(), filestore_core::StoreError>(())
```
*/

pub mod config;
pub mod document;
pub mod error;
pub mod formats;
pub mod manifest;
pub mod observability;
pub mod path;
pub mod storage;
pub mod store;
pub mod table;
pub mod timestamp;

pub use config::{BackendKind, CsvOptions, DirectoryLayout, RemoteConfig, StoreConfig};
pub use document::{Document, DocumentTree, Section};
pub use error::{Result, StoreError};
pub use formats::{FileFormat, FormatRegistry, PayloadKind};
pub use manifest::{Manifest, ManifestEntry};
pub use path::{Role, StoragePath};
pub use storage::{LocalBackend, StorageBackend};
#[cfg(feature = "s3")]
pub use storage::RemoteBackend;
pub use store::{create_store_from_config, FileStore, LoadOptions, SaveOptions, SaveReceipt};
pub use table::{Cell, Table, TabularPayload};

pub use filestore_retry::RetryPolicy;
