//! PDF document codec.
//!
//! Encoding lays text out top-down with a simple y-cursor (larger sizes for
//! the title and headings), paginating when a page fills; raw bytes pass
//! through verbatim. Decoding extracts the text content only; layout does
//! not round-trip.

use super::DocumentCodec;
use crate::document::Document;
use crate::{Result, StoreError};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 15.0;

const TITLE_SIZE: f64 = 16.0;
const HEADING_SIZE: f64 = 13.0;
const BODY_SIZE: f64 = 10.0;

#[derive(Debug)]
pub struct PdfCodec;

fn render_lines(document: &Document) -> Result<Vec<(String, f64)>> {
    let mut lines = Vec::new();
    match document {
        Document::Text(body) => {
            for line in body.lines() {
                lines.push((line.to_string(), BODY_SIZE));
            }
        }
        Document::Tree(tree) => {
            if let Some(title) = &tree.title {
                lines.push((title.clone(), TITLE_SIZE));
            }
            for section in &tree.sections {
                if let Some(heading) = &section.heading {
                    lines.push((heading.clone(), HEADING_SIZE));
                }
                if let Some(text) = &section.text {
                    for line in text.lines() {
                        lines.push((line.to_string(), BODY_SIZE));
                    }
                }
                if let Some(rows) = &section.table {
                    for row in rows {
                        lines.push((row.join(" | "), BODY_SIZE));
                    }
                }
            }
        }
        _ => {
            return Err(StoreError::invalid_payload(
                "pdf output requires text, raw bytes, or a document tree",
            ))
        }
    }
    Ok(lines)
}

impl DocumentCodec for PdfCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        if let Document::Bytes(bytes) = document {
            return Ok(bytes.clone());
        }
        let lines = render_lines(document)?;

        let (doc, first_page, first_layer) = PdfDocument::new(
            "document",
            Mm(PAGE_WIDTH_MM as f32),
            Mm(PAGE_HEIGHT_MM as f32),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| StoreError::storage(format!("pdf write failed: {e}")))?;

        let mut layer = doc.get_page(first_page).get_layer(first_layer);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        for (text, size) in lines {
            let line_height = size * 0.6;
            if y - line_height < MARGIN_MM {
                let (page, new_layer) =
                    doc.add_page(Mm(PAGE_WIDTH_MM as f32), Mm(PAGE_HEIGHT_MM as f32), "Layer 1");
                layer = doc.get_page(page).get_layer(new_layer);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }
            layer.use_text(text, size as f32, Mm(MARGIN_MM as f32), Mm(y as f32), &font);
            y -= line_height;
        }

        let mut buffer = Vec::new();
        doc.save(&mut BufWriter::new(&mut buffer))
            .map_err(|e| StoreError::storage(format!("pdf write failed: {e}")))?;
        Ok(buffer)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| StoreError::invalid_payload(format!("pdf read failed: {e}")))?;
        Ok(Document::Text(text.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentTree, Section};

    #[test]
    fn encoded_output_is_a_pdf() {
        let encoded = PdfCodec.encode(&Document::text("hello world")).unwrap();
        assert!(encoded.starts_with(b"%PDF"));
    }

    #[test]
    fn text_extracts_back_out() {
        let codec = PdfCodec;
        let encoded = codec.encode(&Document::text("extraction marker")).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert!(decoded.as_text().unwrap().contains("extraction"));
    }

    #[test]
    fn tree_renders_title_and_sections() {
        let codec = PdfCodec;
        let tree = DocumentTree::new()
            .with_title("Findings")
            .with_section(Section::heading("Detail", 1).with_text("body text"));
        let encoded = codec.encode(&tree.into()).unwrap();
        assert!(encoded.starts_with(b"%PDF"));
    }

    #[test]
    fn long_documents_paginate() {
        let body = (0..600)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let encoded = PdfCodec.encode(&Document::text(body)).unwrap();
        assert!(encoded.starts_with(b"%PDF"));
    }

    #[test]
    fn value_payload_rejected() {
        let err = PdfCodec
            .encode(&Document::Value(serde_json::json!([1, 2])))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[test]
    fn bytes_pass_through_verbatim() {
        let payload = b"%PDF-1.4 fake".to_vec();
        assert_eq!(
            PdfCodec.encode(&Document::Bytes(payload.clone())).unwrap(),
            payload
        );
    }
}
