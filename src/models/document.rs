//! Parser output models: the serialized result of the upstream document
//! parsing stage. Read-only input to the indexer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single polygon vertex in page coordinates.
pub type Coord = (f64, f64);

/// One structural text unit recognized by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Text lines contained in the block.
    pub text: Vec<String>,
    pub text_block_id: String,
    /// Predicted structural category, e.g. "Text", "Table", "Figure".
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub language: Option<String>,
    /// Page the block appears on. Absent for non-paginated sources.
    #[serde(default)]
    pub page_number: Option<u32>,
    /// Bounding polygon on the page. Absent for non-paginated sources.
    #[serde(default)]
    pub coords: Option<Vec<Coord>>,
}

impl TextBlock {
    /// The block's lines joined into one passage string.
    pub fn to_passage_text(&self) -> String {
        self.text.join("\n")
    }
}

/// Dimensions of a single page, needed to correct inverted coordinate
/// systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub page_number: u32,
    /// (width, height) in page units.
    pub dimensions: (f64, f64),
}

/// Family- and document-level descriptive fields from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub family_import_id: String,
    pub family_slug: String,
    pub publication_ts: DateTime<Utc>,
    pub geography: String,
    pub category: String,
    pub source: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Serialized output of the document parser for one physical document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub document_id: String,
    pub document_name: String,
    pub document_description: String,
    pub document_slug: String,
    pub document_metadata: DocumentMetadata,
    #[serde(default)]
    pub document_md5_sum: Option<String>,
    #[serde(default)]
    pub document_content_type: Option<String>,
    #[serde(default)]
    pub document_cdn_object: Option<String>,
    #[serde(default)]
    pub document_source_url: Option<String>,
    #[serde(default)]
    pub page_metadata: Vec<PageMetadata>,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_document_deserialize() {
        let raw = r#"{
            "document_id": "CCLW.executive.1.0",
            "document_name": "Example name",
            "document_description": "Example description.",
            "document_slug": "example-name",
            "document_md5_sum": "123",
            "document_content_type": "application/pdf",
            "document_metadata": {
                "family_import_id": "CCLW.family.1.0",
                "family_slug": "example-family",
                "publication_ts": "2019-12-25T00:00:00Z",
                "geography": "GBR",
                "category": "Executive",
                "source": "CCLW",
                "languages": ["en"]
            },
            "page_metadata": [
                {"page_number": 1, "dimensions": [612.0, 792.0]}
            ],
            "text_blocks": [
                {
                    "text": ["Example text"],
                    "text_block_id": "p_1_b_0",
                    "type": "Text",
                    "page_number": 1,
                    "coords": [[89.5, 243.0], [519.2, 243.0], [519.2, 303.5], [89.5, 303.5]]
                }
            ]
        }"#;

        let document: ParsedDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(document.document_id, "CCLW.executive.1.0");
        assert_eq!(document.document_metadata.family_import_id, "CCLW.family.1.0");
        assert_eq!(document.text_blocks.len(), 1);
        assert_eq!(document.text_blocks[0].block_type, "Text");
        assert_eq!(document.text_blocks[0].page_number, Some(1));
        assert_eq!(document.page_metadata[0].dimensions, (612.0, 792.0));
        assert!(document.document_cdn_object.is_none());
    }

    #[test]
    fn test_optional_block_fields_default() {
        let raw = r#"{
            "text": ["line one", "line two"],
            "text_block_id": "b_0",
            "type": "Text"
        }"#;

        let block: TextBlock = serde_json::from_str(raw).unwrap();
        assert!(block.page_number.is_none());
        assert!(block.coords.is_none());
        assert_eq!(block.to_passage_text(), "line one\nline two");
    }
}
