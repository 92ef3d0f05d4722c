//! JSON codecs (tabular records and structured documents).

use super::{DocumentCodec, TabularCodec};
use crate::document::Document;
use crate::table::Table;
use crate::{Result, StoreError};
use serde_json::Value;

/// Tabular JSON: a list of records, one object per row.
#[derive(Debug)]
pub struct JsonTableCodec;

impl TabularCodec for JsonTableCodec {
    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        let records = Value::Array(table.to_records());
        Ok(serde_json::to_vec_pretty(&records)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        let value: Value = serde_json::from_slice(bytes)?;
        Table::from_json_payload(&value)
    }
}

/// Render a document payload to a JSON value.
///
/// Shared with the YAML document codec, which goes through the same
/// representation.
pub(super) fn document_to_value(document: &Document) -> Result<Value> {
    match document {
        Document::Value(value) => Ok(value.clone()),
        Document::Text(body) => Ok(Value::String(body.clone())),
        Document::Tree(tree) => Ok(serde_json::to_value(tree)?),
        Document::Markdown { front_matter, body } => Ok(serde_json::json!({
            "front_matter": front_matter,
            "body": body,
        })),
        Document::Bytes(_) => Err(StoreError::invalid_payload(
            "raw bytes cannot be stored as a structured document",
        )),
    }
}

/// Structured JSON document: arbitrary value in, [`Document::Value`] out.
#[derive(Debug)]
pub struct JsonDocumentCodec;

impl DocumentCodec for JsonDocumentCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        let value = document_to_value(document)?;
        Ok(serde_json::to_vec_pretty(&value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Document::Value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentTree, Section};
    use crate::table::Cell;

    #[test]
    fn table_roundtrip() {
        let table = Table::with_rows(
            vec!["a", "b"],
            vec![
                vec![Cell::Int(1), Cell::Str("x".into())],
                vec![Cell::Null, Cell::Str("y".into())],
            ],
        )
        .unwrap();

        let codec = JsonTableCodec;
        let decoded = codec.decode(&codec.encode(&table).unwrap()).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn scalar_payload_rejected() {
        let err = JsonTableCodec.decode(b"42").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[test]
    fn document_value_roundtrip() {
        let codec = JsonDocumentCodec;
        let doc = Document::Value(serde_json::json!({"k": [1, 2, 3]}));
        let decoded = codec.decode(&codec.encode(&doc).unwrap()).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn tree_encodes_as_structured_value() {
        let codec = JsonDocumentCodec;
        let doc = Document::Tree(
            DocumentTree::new()
                .with_title("T")
                .with_section(Section::text("body")),
        );
        let decoded = codec.decode(&codec.encode(&doc).unwrap()).unwrap();
        match decoded {
            Document::Value(value) => assert_eq!(value["title"], "T"),
            other => panic!("expected value document, got {other:?}"),
        }
    }

    #[test]
    fn bytes_payload_rejected() {
        let err = JsonDocumentCodec
            .encode(&Document::Bytes(vec![1, 2]))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }
}
