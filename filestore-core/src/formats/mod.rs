/*!
Format dispatch: a closed codec registry keyed by (kind, file format).

Rather than branching on extension strings at every call site, the registry
is populated once at construction with one codec per supported (kind,
format) pair; an unknown combination is a lookup miss
(`UnsupportedFormat`), not a runtime type check. JSON and YAML are
registered under both kinds; the caller's entry point (tabular vs.
document) fixes the kind.
*/

mod csv;
mod docx;
mod json;
mod markdown;
mod parquet;
mod pdf;
mod pptx;
mod xlsx;
mod yaml;

use crate::config::CsvOptions;
use crate::document::Document;
use crate::table::Table;
use crate::{Result, StoreError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Logical payload kind selecting the codec family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Tabular,
    Document,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Tabular => f.write_str("tabular"),
            PayloadKind::Document => f.write_str("document"),
        }
    }
}

/// Supported file formats, identified by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Parquet,
    Json,
    Yaml,
    Docx,
    Markdown,
    Pdf,
    Pptx,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Parquet => "parquet",
            FileFormat::Json => "json",
            FileFormat::Yaml => "yaml",
            FileFormat::Docx => "docx",
            FileFormat::Markdown => "md",
            FileFormat::Pdf => "pdf",
            FileFormat::Pptx => "pptx",
        }
    }

    /// Look up a format by file extension.
    pub fn from_extension(ext: &str) -> Option<FileFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            "parquet" => Some(FileFormat::Parquet),
            "json" => Some(FileFormat::Json),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "docx" => Some(FileFormat::Docx),
            "md" => Some(FileFormat::Markdown),
            "pdf" => Some(FileFormat::Pdf),
            "pptx" => Some(FileFormat::Pptx),
            _ => None,
        }
    }

    /// Infer the format from a file name's suffix.
    pub fn from_file_name(name: &str) -> Result<FileFormat> {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext).ok_or_else(|| {
            StoreError::config(format!("file name '{name}' has no extension"))
        })?;
        Self::from_extension(ext).ok_or_else(|| StoreError::UnsupportedFormat {
            kind: "any".to_string(),
            format: ext.to_string(),
        })
    }

    /// Whether one file of this format can hold multiple named datasets.
    pub fn is_workbook(&self) -> bool {
        matches!(self, FileFormat::Xlsx)
    }

    pub const ALL: [FileFormat; 9] = [
        FileFormat::Csv,
        FileFormat::Xlsx,
        FileFormat::Parquet,
        FileFormat::Json,
        FileFormat::Yaml,
        FileFormat::Docx,
        FileFormat::Markdown,
        FileFormat::Pdf,
        FileFormat::Pptx,
    ];
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl Serialize for FileFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.extension())
    }
}

impl<'de> Deserialize<'de> for FileFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FileFormat::from_extension(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown file format '{s}'")))
    }
}

/// Encode/decode pair for one tabular format.
///
/// Workbook-capable formats additionally encode an ordered set of named
/// sheets into a single file; for the rest the facade falls back to one
/// file per name plus a manifest.
pub trait TabularCodec: Send + Sync + fmt::Debug {
    fn encode(&self, table: &Table) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Table>;

    fn encode_workbook(&self, _sheets: &[(String, Table)]) -> Result<Vec<u8>> {
        Err(StoreError::invalid_payload(
            "this format stores one dataset per file; multi-sheet output requires a workbook format",
        ))
    }

    fn decode_workbook(&self, bytes: &[u8]) -> Result<Vec<(String, Table)>> {
        Ok(vec![("Sheet1".to_string(), self.decode(bytes)?)])
    }
}

/// Encode/decode pair for one document format.
pub trait DocumentCodec: Send + Sync + fmt::Debug {
    fn encode(&self, document: &Document) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Document>;
}

/// Closed table of codecs, populated once at facade construction.
pub struct FormatRegistry {
    tabular: HashMap<FileFormat, Box<dyn TabularCodec>>,
    document: HashMap<FileFormat, Box<dyn DocumentCodec>>,
}

impl FormatRegistry {
    /// Build the registry with every supported codec.
    pub fn new(csv_options: CsvOptions) -> Self {
        let mut tabular: HashMap<FileFormat, Box<dyn TabularCodec>> = HashMap::new();
        tabular.insert(FileFormat::Csv, Box::new(csv::CsvCodec::new(csv_options)));
        tabular.insert(FileFormat::Xlsx, Box::new(xlsx::XlsxCodec));
        tabular.insert(FileFormat::Parquet, Box::new(parquet::ParquetCodec));
        tabular.insert(FileFormat::Json, Box::new(json::JsonTableCodec));
        tabular.insert(FileFormat::Yaml, Box::new(yaml::YamlTableCodec));

        let mut document: HashMap<FileFormat, Box<dyn DocumentCodec>> = HashMap::new();
        document.insert(FileFormat::Json, Box::new(json::JsonDocumentCodec));
        document.insert(FileFormat::Yaml, Box::new(yaml::YamlDocumentCodec));
        document.insert(FileFormat::Markdown, Box::new(markdown::MarkdownCodec));
        document.insert(FileFormat::Docx, Box::new(docx::DocxCodec));
        document.insert(FileFormat::Pdf, Box::new(pdf::PdfCodec));
        document.insert(FileFormat::Pptx, Box::new(pptx::PptxCodec));

        Self { tabular, document }
    }

    /// Look up the tabular codec for a format.
    pub fn tabular(&self, format: FileFormat) -> Result<&dyn TabularCodec> {
        self.tabular
            .get(&format)
            .map(|codec| &**codec)
            .ok_or_else(|| StoreError::UnsupportedFormat {
                kind: PayloadKind::Tabular.to_string(),
                format: format.to_string(),
            })
    }

    /// Look up the document codec for a format.
    pub fn document(&self, format: FileFormat) -> Result<&dyn DocumentCodec> {
        self.document
            .get(&format)
            .map(|codec| &**codec)
            .ok_or_else(|| StoreError::UnsupportedFormat {
                kind: PayloadKind::Document.to_string(),
                format: format.to_string(),
            })
    }

    /// Whether the (kind, format) pair has a registered codec.
    pub fn supports(&self, kind: PayloadKind, format: FileFormat) -> bool {
        match kind {
            PayloadKind::Tabular => self.tabular.contains_key(&format),
            PayloadKind::Document => self.document.contains_key(&format),
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(CsvOptions::default())
    }
}
