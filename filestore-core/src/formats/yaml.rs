//! YAML codecs (tabular records and structured documents).
//!
//! YAML payloads are normalized through the JSON value representation so
//! both codecs share the same record/document semantics.

use super::json::document_to_value;
use super::{DocumentCodec, TabularCodec};
use crate::document::Document;
use crate::table::Table;
use crate::Result;
use serde_json::Value;

fn to_yaml_bytes(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_yaml::to_string(value)?.into_bytes())
}

fn from_yaml_bytes(bytes: &[u8]) -> Result<Value> {
    let yaml: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    Ok(serde_json::to_value(yaml)?)
}

/// Tabular YAML: a list of records.
#[derive(Debug)]
pub struct YamlTableCodec;

impl TabularCodec for YamlTableCodec {
    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        to_yaml_bytes(&Value::Array(table.to_records()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        Table::from_json_payload(&from_yaml_bytes(bytes)?)
    }
}

/// Structured YAML document.
#[derive(Debug)]
pub struct YamlDocumentCodec;

impl DocumentCodec for YamlDocumentCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        to_yaml_bytes(&document_to_value(document)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        Ok(Document::Value(from_yaml_bytes(bytes)?))
    }
}
