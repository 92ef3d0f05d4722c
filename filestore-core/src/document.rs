/*!
Document payload model for the document-kind codecs.
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content accepted and produced by the document codecs.
///
/// Which variants a codec accepts depends on the target format; a mismatch
/// is an invalid payload, not a silent conversion. Container formats that
/// cannot represent their source structure on load (DOCX, PDF) decode to
/// extracted [`Document::Text`].
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Plain text body
    Text(String),
    /// Opaque container bytes, stored verbatim
    Bytes(Vec<u8>),
    /// Arbitrary structured content (JSON/YAML documents)
    Value(Value),
    /// Ordered section tree rendered into the target format
    Tree(DocumentTree),
    /// Front matter plus text body (Markdown)
    Markdown { front_matter: Value, body: String },
}

impl Document {
    pub fn text<S: Into<String>>(body: S) -> Self {
        Document::Text(body.into())
    }

    pub fn markdown<S: Into<String>>(front_matter: Value, body: S) -> Self {
        Document::Markdown {
            front_matter,
            body: body.into(),
        }
    }

    /// The text body, if this document has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Document::Text(body) => Some(body),
            Document::Markdown { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<DocumentTree> for Document {
    fn from(tree: DocumentTree) -> Self {
        Document::Tree(tree)
    }
}

/// An ordered document tree: optional title plus sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }
}

/// One section of a document tree: optionally a heading, a text block,
/// and/or a table of rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<Vec<String>>>,
}

fn default_level() -> u8 {
    1
}

impl Section {
    pub fn heading<S: Into<String>>(heading: S, level: u8) -> Self {
        Self {
            heading: Some(heading.into()),
            level,
            ..Self::default()
        }
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            level: default_level(),
            ..Self::default()
        }
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_table(mut self, rows: Vec<Vec<String>>) -> Self {
        self.table = Some(rows);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_serializes_without_empty_fields() {
        let tree = DocumentTree::new()
            .with_title("Report")
            .with_section(Section::heading("Results", 1).with_text("All good."));
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["title"], "Report");
        assert_eq!(json["sections"][0]["heading"], "Results");
        assert!(json["sections"][0].get("table").is_none());
    }

    #[test]
    fn section_level_defaults_to_one() {
        let section: Section = serde_json::from_value(serde_json::json!({
            "heading": "Intro"
        }))
        .unwrap();
        assert_eq!(section.level, 1);
    }
}
