//! Lazy generation of index records from parser output and embeddings.
//!
//! The generator yields one `(schema, id, fields)` record at a time: the
//! singleton search weights first, then per document a family document
//! followed by its passages. Only the current document's records are held
//! in memory, so arbitrarily large inputs stream through at bounded cost.

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{EmbeddingError, GenerateError, ValidationError};
use crate::models::{
    DocumentPassage, FamilyDocument, ParsedDocument, SEARCH_WEIGHTS_ID, Schema, SearchWeights,
};
use crate::services::embeddings::EmbeddingStore;
use crate::services::geometry::{BlockCorrection, correct_block_geometry};

const PROGRESS_LOG_INTERVAL: usize = 50;

/// One record ready for submission: schema, document id, and serialized
/// fields.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub schema: Schema,
    pub id: String,
    pub fields: Value,
}

impl FeedDocument {
    fn new(
        schema: Schema,
        id: String,
        record: &impl Serialize,
    ) -> Result<Self, ValidationError> {
        let fields = serde_json::to_value(record).map_err(|e| ValidationError::Serialize {
            schema,
            id: id.clone(),
            source: e,
        })?;
        Ok(Self { schema, id, fields })
    }
}

/// Pull-based producer of index records. A consumer may stop pulling at any
/// point; nothing beyond the current document's records is buffered. After
/// a fatal error the iterator is fused.
pub struct DocumentGenerator<I> {
    tasks: I,
    embedding_store: EmbeddingStore,
    pending: VecDeque<FeedDocument>,
    weights_emitted: bool,
    finished: bool,
    document_count: usize,
}

impl<I> DocumentGenerator<I>
where
    I: Iterator<Item = ParsedDocument>,
{
    pub fn new(tasks: I, embedding_store: EmbeddingStore) -> Self {
        Self {
            tasks,
            embedding_store,
            pending: VecDeque::new(),
            weights_emitted: false,
            finished: false,
            document_count: 0,
        }
    }

    /// Loads the document's matrix and stages its family document and
    /// passage records in emission order.
    fn stage_document(&mut self, task: ParsedDocument) -> Result<(), GenerateError> {
        let embeddings = self.embedding_store.load(&task.document_id)?;

        let expected_rows = task.text_blocks.len() + 1;
        if embeddings.nrows() != expected_rows {
            return Err(EmbeddingError::RowMismatch {
                document_id: task.document_id.clone(),
                rows: embeddings.nrows(),
                expected: expected_rows,
            }
            .into());
        }

        let weights_ref = Schema::SearchWeights.doc_ref(SEARCH_WEIGHTS_ID);
        let family_id = task.document_metadata.family_import_id.clone();
        let family =
            FamilyDocument::from_parsed(&task, embeddings.row(0).to_vec(), &weights_ref)?;
        self.pending.push_back(FeedDocument::new(
            Schema::FamilyDocument,
            family_id.clone(),
            &family,
        )?);

        self.document_count += 1;
        if self.document_count % PROGRESS_LOG_INTERVAL == 0 {
            info!(
                documents = self.document_count,
                "document generator progress"
            );
        }

        let blocks = match correct_block_geometry(&task) {
            BlockCorrection::Corrected(blocks) => blocks,
            BlockCorrection::Fallback { blocks, reason } => {
                warn!(
                    document_id = %task.document_id,
                    error = %reason,
                    "coordinate correction failed, passages keep original coordinates"
                );
                blocks
            }
        };

        let family_ref = Schema::FamilyDocument.doc_ref(&family_id);
        for (ordinal, (block, embedding)) in
            blocks.iter().zip(embeddings.outer_iter().skip(1)).enumerate()
        {
            let passage = DocumentPassage::from_block(
                &family_ref,
                &weights_ref,
                block,
                embedding.to_vec(),
            )?;
            self.pending.push_back(FeedDocument::new(
                Schema::DocumentPassage,
                format!("{}.{}", task.document_id, ordinal),
                &passage,
            )?);
        }

        Ok(())
    }
}

impl<I> Iterator for DocumentGenerator<I>
where
    I: Iterator<Item = ParsedDocument>,
{
    type Item = Result<FeedDocument, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.weights_emitted {
            self.weights_emitted = true;
            let weights = FeedDocument::new(
                Schema::SearchWeights,
                SEARCH_WEIGHTS_ID.to_string(),
                &SearchWeights::default_weights(),
            );
            return Some(weights.map_err(GenerateError::from));
        }

        loop {
            if let Some(document) = self.pending.pop_front() {
                return Some(Ok(document));
            }

            match self.tasks.next() {
                Some(task) => {
                    if let Err(e) = self.stage_document(task) {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
                None => {
                    self.finished = true;
                    info!(
                        documents = self.document_count,
                        "document generator finished"
                    );
                    return None;
                }
            }
        }
    }
}
