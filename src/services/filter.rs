//! Category-based text block filtering, applied before generation.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::models::ParsedDocument;

/// Removes text blocks whose category is in `remove_block_types`. Block
/// order and every other document field are preserved; documents left with
/// zero blocks stay in the sequence since they still carry document-level
/// data.
pub fn filter_on_block_type(
    inputs: Vec<ParsedDocument>,
    remove_block_types: &[String],
) -> Vec<ParsedDocument> {
    info!(
        block_types = ?remove_block_types,
        "filtering unwanted text block types"
    );

    let remove: HashSet<&str> = remove_block_types.iter().map(String::as_str).collect();

    inputs
        .into_iter()
        .map(|mut document| {
            let before = document.text_blocks.len();
            document
                .text_blocks
                .retain(|block| !remove.contains(block.block_type.as_str()));
            let removed = before - document.text_blocks.len();
            if removed > 0 {
                debug!(
                    document_id = %document.document_id,
                    removed,
                    retained = document.text_blocks.len(),
                    "filtered text blocks"
                );
            }
            document
        })
        .collect()
}
