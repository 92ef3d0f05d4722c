//! DOCX document codec.
//!
//! Encoding renders text or a section tree into a Word document (headings,
//! paragraphs, tables); raw bytes pass through verbatim so existing
//! documents can be re-stored. Decoding extracts the visible text, joining
//! table cells with `" | "`; the container structure itself does not
//! round-trip.

use super::DocumentCodec;
use crate::document::Document;
use crate::{Result, StoreError};
use docx_rs::{
    read_docx, Docx, DocumentChild, Paragraph, Run, Table as DocxTable, TableCell,
    TableCellContent, TableChild, TableRow, TableRowChild,
};
use std::io::Cursor;

#[derive(Debug)]
pub struct DocxCodec;

fn paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn build_table(rows: &[Vec<String>]) -> DocxTable {
    let table_rows: Vec<TableRow> = rows
        .iter()
        .map(|row| {
            TableRow::new(
                row.iter()
                    .map(|cell| TableCell::new().add_paragraph(paragraph(cell)))
                    .collect(),
            )
        })
        .collect();
    DocxTable::new(table_rows)
}

impl DocumentCodec for DocxCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        let mut docx = Docx::new();
        match document {
            Document::Bytes(bytes) => return Ok(bytes.clone()),
            Document::Text(body) => {
                for line in body.lines() {
                    docx = docx.add_paragraph(paragraph(line));
                }
            }
            Document::Tree(tree) => {
                if let Some(title) = &tree.title {
                    docx = docx.add_paragraph(paragraph(title).style("Title"));
                }
                for section in &tree.sections {
                    if let Some(heading) = &section.heading {
                        let style = format!("Heading{}", section.level.max(1));
                        docx = docx.add_paragraph(paragraph(heading).style(&style));
                    }
                    if let Some(text) = &section.text {
                        docx = docx.add_paragraph(paragraph(text));
                    }
                    if let Some(rows) = &section.table {
                        if !rows.is_empty() {
                            docx = docx.add_table(build_table(rows));
                        }
                    }
                }
            }
            Document::Value(_) | Document::Markdown { .. } => {
                return Err(StoreError::invalid_payload(
                    "docx output requires text, raw bytes, or a document tree",
                ))
            }
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| StoreError::storage(format!("docx write failed: {e}")))?;
        Ok(cursor.into_inner())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        let docx = read_docx(bytes)
            .map_err(|e| StoreError::invalid_payload(format!("docx read failed: {e}")))?;

        let mut lines: Vec<String> = Vec::new();
        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(p) => {
                    let text = p.raw_text();
                    if !text.trim().is_empty() {
                        lines.push(text);
                    }
                }
                DocumentChild::Table(table) => {
                    for row in &table.rows {
                        let TableChild::TableRow(row) = row;
                        let mut cells: Vec<String> = Vec::new();
                        for cell in &row.cells {
                            let TableRowChild::TableCell(cell) = cell;
                            for content in &cell.children {
                                if let TableCellContent::Paragraph(p) = content {
                                    let text = p.raw_text();
                                    if !text.trim().is_empty() {
                                        cells.push(text);
                                    }
                                }
                            }
                        }
                        if !cells.is_empty() {
                            lines.push(cells.join(" | "));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(Document::Text(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentTree, Section};

    #[test]
    fn text_extracts_back_out() {
        let codec = DocxCodec;
        let encoded = codec
            .encode(&Document::text("first line\nsecond line"))
            .unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(
            decoded,
            Document::Text("first line\nsecond line".to_string())
        );
    }

    #[test]
    fn tree_renders_headings_text_and_tables() {
        let codec = DocxCodec;
        let tree = DocumentTree::new()
            .with_title("Quarterly Report")
            .with_section(
                Section::heading("Summary", 1)
                    .with_text("All metrics improved.")
                    .with_table(vec![
                        vec!["metric".to_string(), "value".to_string()],
                        vec!["uptime".to_string(), "99.9".to_string()],
                    ]),
            );

        let encoded = codec.encode(&tree.into()).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        let text = decoded.as_text().unwrap();
        assert!(text.contains("Quarterly Report"));
        assert!(text.contains("Summary"));
        assert!(text.contains("All metrics improved."));
        assert!(text.contains("metric | value"));
    }

    #[test]
    fn bytes_pass_through_verbatim() {
        let codec = DocxCodec;
        let payload = vec![0x50, 0x4b, 0x03, 0x04, 0xff];
        assert_eq!(
            codec.encode(&Document::Bytes(payload.clone())).unwrap(),
            payload
        );
    }

    #[test]
    fn value_payload_rejected() {
        let err = DocxCodec
            .encode(&Document::Value(serde_json::json!({"k": 1})))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }
}
