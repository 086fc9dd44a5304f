//! Typed records accepted by the search index, one struct per schema, plus
//! the builders that map parser output onto them.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::document::{Coord, ParsedDocument, TextBlock};

/// Namespace all documents are fed under.
pub const NAMESPACE: &str = "doc_search";

/// Identifier of the singleton search weights record.
pub const SEARCH_WEIGHTS_ID: &str = "default_weights";

/// Fixed embedding dimension shared by summary and passage vectors.
pub const EMBEDDING_DIM: usize = 768;

/// Record shapes accepted by the index. Variant order is the feed order:
/// referents before referrers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Schema {
    SearchWeights,
    FamilyDocument,
    DocumentPassage,
}

impl Schema {
    pub const ALL: [Schema; 3] = [
        Schema::SearchWeights,
        Schema::FamilyDocument,
        Schema::DocumentPassage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Schema::SearchWeights => "search_weights",
            Schema::FamilyDocument => "family_document",
            Schema::DocumentPassage => "document_passage",
        }
    }

    /// Address of a record of this schema, used both on the wire and in
    /// cross-schema reference fields.
    pub fn doc_ref(self, id: &str) -> String {
        format!("id:{}:{}::{}", NAMESPACE, self.as_str(), id)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weights applied to each ranking element in searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchWeights {
    pub name_weight: f64,
    pub description_weight: f64,
    pub passage_weight: f64,
}

impl SearchWeights {
    /// The singleton weights record. Produced exactly once per run,
    /// independent of input.
    pub fn default_weights() -> Self {
        Self {
            name_weight: 2.5,
            description_weight: 2.0,
            passage_weight: 1.0,
        }
    }
}

/// Family and document combined data useful for search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyDocument {
    pub search_weights_ref: String,
    pub family_name: String,
    pub family_name_index: String,
    pub family_description: String,
    pub family_description_index: String,
    pub family_description_embedding: Vec<f32>,
    pub family_import_id: String,
    pub family_slug: String,
    pub family_publication_ts: String,
    pub family_publication_year: i32,
    pub family_category: String,
    pub family_geography: String,
    pub family_source: String,
    pub document_import_id: String,
    pub document_slug: String,
    pub document_languages: Vec<String>,
    pub document_md5_sum: Option<String>,
    pub document_content_type: Option<String>,
    pub document_cdn_object: Option<String>,
    pub document_source_url: Option<String>,
}

impl FamilyDocument {
    /// Deterministic field mapping from a parsed document plus its summary
    /// embedding (row 0 of the document's matrix).
    pub fn from_parsed(
        task: &ParsedDocument,
        description_embedding: Vec<f32>,
        search_weights_ref: &str,
    ) -> Result<Self, ValidationError> {
        check_embedding_dim(
            Schema::FamilyDocument,
            &task.document_metadata.family_import_id,
            &description_embedding,
        )?;

        let metadata = &task.document_metadata;
        Ok(Self {
            search_weights_ref: search_weights_ref.to_string(),
            family_name: task.document_name.clone(),
            family_name_index: task.document_name.clone(),
            family_description: task.document_description.clone(),
            family_description_index: task.document_description.clone(),
            family_description_embedding: description_embedding,
            family_import_id: metadata.family_import_id.clone(),
            family_slug: metadata.family_slug.clone(),
            family_publication_ts: metadata.publication_ts.to_rfc3339(),
            family_publication_year: metadata.publication_ts.year(),
            family_category: metadata.category.clone(),
            family_geography: metadata.geography.clone(),
            family_source: metadata.source.clone(),
            document_import_id: task.document_id.clone(),
            document_slug: task.document_slug.clone(),
            document_languages: metadata.languages.clone(),
            document_md5_sum: task.document_md5_sum.clone(),
            document_content_type: task.document_content_type.clone(),
            document_cdn_object: task.document_cdn_object.clone(),
            document_source_url: task.document_source_url.clone(),
        })
    }
}

/// One retained text passage of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPassage {
    pub search_weights_ref: String,
    pub family_document_ref: String,
    pub text_block: String,
    pub text_block_id: String,
    pub text_block_type: String,
    pub text_block_page: Option<u32>,
    pub text_block_coords: Option<Vec<Coord>>,
    pub text_embedding: Vec<f32>,
}

impl DocumentPassage {
    /// Builds a passage record from a retained text block and its embedding
    /// row. Positional fields are copied only when the source block carries
    /// them.
    pub fn from_block(
        family_document_ref: &str,
        search_weights_ref: &str,
        block: &TextBlock,
        embedding: Vec<f32>,
    ) -> Result<Self, ValidationError> {
        check_embedding_dim(Schema::DocumentPassage, &block.text_block_id, &embedding)?;

        Ok(Self {
            search_weights_ref: search_weights_ref.to_string(),
            family_document_ref: family_document_ref.to_string(),
            text_block: block.to_passage_text(),
            text_block_id: block.text_block_id.clone(),
            text_block_type: block.block_type.clone(),
            text_block_page: block.page_number,
            text_block_coords: block.coords.clone(),
            text_embedding: embedding,
        })
    }
}

fn check_embedding_dim(
    schema: Schema,
    id: &str,
    embedding: &[f32],
) -> Result<(), ValidationError> {
    if embedding.len() != EMBEDDING_DIM {
        return Err(ValidationError::EmbeddingDim {
            id: format!("{}:{}", schema, id),
            expected: EMBEDDING_DIM,
            actual: embedding.len(),
        });
    }
    Ok(())
}
