//! Markdown document codec.
//!
//! Supports a YAML front-matter/body split that round-trips as a single
//! structured object on load: files starting with a `---` fence decode to
//! [`Document::Markdown`], everything else to [`Document::Text`].

use super::DocumentCodec;
use crate::document::{Document, DocumentTree};
use crate::{Result, StoreError};
use serde_json::Value;

#[derive(Debug)]
pub struct MarkdownCodec;

fn has_front_matter(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn render_front_matter(front_matter: &Value, body: &str) -> Result<String> {
    if !has_front_matter(front_matter) {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(front_matter)?;
    Ok(format!("---\n{yaml}---\n\n{body}"))
}

fn render_tree(tree: &DocumentTree) -> String {
    let mut out = String::new();
    if let Some(title) = &tree.title {
        out.push_str(&format!("# {title}\n\n"));
    }
    for section in &tree.sections {
        if let Some(heading) = &section.heading {
            let depth = usize::from(section.level.max(1)).saturating_add(1).min(6);
            out.push_str(&format!("{} {heading}\n\n", "#".repeat(depth)));
        }
        if let Some(text) = &section.text {
            out.push_str(text);
            out.push_str("\n\n");
        }
        if let Some(rows) = &section.table {
            for (index, row) in rows.iter().enumerate() {
                out.push_str(&format!("| {} |\n", row.join(" | ")));
                if index == 0 {
                    out.push_str(&format!("|{}\n", " --- |".repeat(row.len())));
                }
            }
            out.push('\n');
        }
    }
    out
}

impl DocumentCodec for MarkdownCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        let text = match document {
            Document::Text(body) => body.clone(),
            Document::Markdown { front_matter, body } => {
                render_front_matter(front_matter, body)?
            }
            Document::Tree(tree) => render_tree(tree),
            Document::Bytes(bytes) => return Ok(bytes.clone()),
            Document::Value(_) => {
                return Err(StoreError::invalid_payload(
                    "markdown output requires text, front-matter content, or a document tree",
                ))
            }
        };
        Ok(text.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| StoreError::invalid_payload(format!("markdown is not UTF-8: {e}")))?;

        if let Some(rest) = text.strip_prefix("---\n") {
            if let Some((front, body)) = rest.split_once("---\n") {
                if let Ok(yaml) = serde_yaml::from_str::<serde_yaml::Value>(front) {
                    if let Ok(front_matter) = serde_json::to_value(yaml) {
                        return Ok(Document::Markdown {
                            front_matter,
                            body: body.trim().to_string(),
                        });
                    }
                }
            }
        }
        Ok(Document::Text(text))
    }
}
