//! Coordinate system correction for text block polygons.
//!
//! Some parsers emit page coordinates with the origin at the top-left while
//! the index's rendering convention expects the origin at the bottom-left.
//! Flipping requires per-page dimensions; when those are incomplete the
//! document keeps its original coordinates and the run continues.

use std::collections::HashMap;

use crate::error::GeometryError;
use crate::models::{ParsedDocument, TextBlock};

/// Outcome of a correction attempt over one document's blocks.
#[derive(Debug, Clone)]
pub enum BlockCorrection {
    /// All positional blocks were flipped into the index convention.
    Corrected(Vec<TextBlock>),
    /// Correction failed; `blocks` are the original, uncorrected blocks.
    Fallback {
        blocks: Vec<TextBlock>,
        reason: GeometryError,
    },
}

impl BlockCorrection {
    pub fn into_blocks(self) -> Vec<TextBlock> {
        match self {
            BlockCorrection::Corrected(blocks) => blocks,
            BlockCorrection::Fallback { blocks, .. } => blocks,
        }
    }
}

/// Vertically flips the coordinates of every positional text block in the
/// document. Blocks without coordinates pass through unchanged. Any block
/// that cannot be flipped causes the whole document to fall back.
pub fn correct_block_geometry(document: &ParsedDocument) -> BlockCorrection {
    let page_heights: HashMap<u32, f64> = document
        .page_metadata
        .iter()
        .map(|page| (page.page_number, page.dimensions.1))
        .collect();

    let mut corrected = Vec::with_capacity(document.text_blocks.len());
    for block in &document.text_blocks {
        let Some(coords) = &block.coords else {
            corrected.push(block.clone());
            continue;
        };

        let Some(page_number) = block.page_number else {
            return fallback(
                document,
                GeometryError::MissingPageNumber {
                    text_block_id: block.text_block_id.clone(),
                },
            );
        };

        let Some(&height) = page_heights.get(&page_number) else {
            return fallback(
                document,
                GeometryError::MissingPageDimensions {
                    page_number,
                    text_block_id: block.text_block_id.clone(),
                },
            );
        };

        let flipped = coords.iter().map(|&(x, y)| (x, height - y)).collect();
        let mut block = block.clone();
        block.coords = Some(flipped);
        corrected.push(block);
    }

    BlockCorrection::Corrected(corrected)
}

fn fallback(document: &ParsedDocument, reason: GeometryError) -> BlockCorrection {
    BlockCorrection::Fallback {
        blocks: document.text_blocks.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::models::{DocumentMetadata, PageMetadata};

    fn document(
        page_metadata: Vec<PageMetadata>,
        text_blocks: Vec<TextBlock>,
    ) -> ParsedDocument {
        ParsedDocument {
            document_id: "test_id".to_string(),
            document_name: "test_name".to_string(),
            document_description: "test_description".to_string(),
            document_slug: "test_slug".to_string(),
            document_metadata: DocumentMetadata {
                family_import_id: "test_family_id".to_string(),
                family_slug: "test_family_slug".to_string(),
                publication_ts: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                geography: "".to_string(),
                category: "".to_string(),
                source: "".to_string(),
                languages: vec![],
            },
            document_md5_sum: None,
            document_content_type: None,
            document_cdn_object: None,
            document_source_url: None,
            page_metadata,
            text_blocks,
        }
    }

    fn positional_block(page_number: u32) -> TextBlock {
        TextBlock {
            text: vec!["text".to_string()],
            text_block_id: format!("p_{}_b_0", page_number),
            block_type: "Text".to_string(),
            language: None,
            page_number: Some(page_number),
            coords: Some(vec![(89.5, 243.0), (519.2, 243.0), (519.2, 303.5), (89.5, 303.5)]),
        }
    }

    fn plain_block() -> TextBlock {
        TextBlock {
            text: vec!["text".to_string()],
            text_block_id: "b_0".to_string(),
            block_type: "Text".to_string(),
            language: None,
            page_number: None,
            coords: None,
        }
    }

    #[test]
    fn test_flip_coordinates() {
        let doc = document(
            vec![PageMetadata {
                page_number: 1,
                dimensions: (612.0, 792.0),
            }],
            vec![positional_block(1)],
        );

        match correct_block_geometry(&doc) {
            BlockCorrection::Corrected(blocks) => {
                let coords = blocks[0].coords.as_ref().unwrap();
                assert_eq!(coords[0], (89.5, 792.0 - 243.0));
                assert_eq!(coords[2], (519.2, 792.0 - 303.5));
            }
            BlockCorrection::Fallback { reason, .. } => {
                panic!("expected corrected blocks, got fallback: {}", reason)
            }
        }
    }

    #[test]
    fn test_blocks_without_coords_pass_through() {
        let doc = document(vec![], vec![plain_block()]);
        match correct_block_geometry(&doc) {
            BlockCorrection::Corrected(blocks) => {
                assert!(blocks[0].coords.is_none());
            }
            BlockCorrection::Fallback { .. } => panic!("expected corrected blocks"),
        }
    }

    #[test]
    fn test_missing_page_dimensions_falls_back() {
        let doc = document(vec![], vec![positional_block(3)]);
        match correct_block_geometry(&doc) {
            BlockCorrection::Fallback { blocks, reason } => {
                // Original coordinates survive untouched.
                assert_eq!(blocks[0].coords.as_ref().unwrap()[0], (89.5, 243.0));
                assert!(matches!(
                    reason,
                    GeometryError::MissingPageDimensions { page_number: 3, .. }
                ));
            }
            BlockCorrection::Corrected(_) => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_missing_page_number_falls_back() {
        let mut block = positional_block(1);
        block.page_number = None;
        let doc = document(
            vec![PageMetadata {
                page_number: 1,
                dimensions: (612.0, 792.0),
            }],
            vec![block],
        );

        assert!(matches!(
            correct_block_geometry(&doc),
            BlockCorrection::Fallback {
                reason: GeometryError::MissingPageNumber { .. },
                ..
            }
        ));
    }
}
