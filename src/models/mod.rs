pub mod config;
pub mod document;
pub mod records;

pub use config::{Config, FilterConfig, IndexConfig, IndexConnection};
pub use document::{Coord, DocumentMetadata, PageMetadata, ParsedDocument, TextBlock};
pub use records::{
    DocumentPassage, EMBEDDING_DIM, FamilyDocument, NAMESPACE, SEARCH_WEIGHTS_ID, Schema,
    SearchWeights,
};
