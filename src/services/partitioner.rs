//! Schema-partitioned accumulation of generated records.
//!
//! Records buffer per schema until the family-document buffer is full, at
//! which point all non-empty buffers are handed over together. The
//! threshold check happens at family-document boundaries, so a flush
//! always carries whole documents: a passage is never split from the flush
//! cycle that queued its family document.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::Schema;
use crate::services::generator::FeedDocument;

/// One buffered record, ready for the wire.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub id: String,
    pub fields: Value,
}

/// All buffered records of one flush cycle, grouped by schema.
#[derive(Debug, Default)]
pub struct FeedBatch {
    entries: BTreeMap<Schema, Vec<FeedEntry>>,
}

impl FeedBatch {
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Total entries across all schemas.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn entries(&self, schema: Schema) -> &[FeedEntry] {
        self.entries.get(&schema).map_or(&[], Vec::as_slice)
    }

    /// Consumes the batch in dependency order: weights, then family
    /// documents, then passages. `Schema`'s `Ord` is that order, so the
    /// map iterates correctly by construction.
    pub fn into_schema_order(self) -> impl Iterator<Item = (Schema, Vec<FeedEntry>)> {
        self.entries.into_iter().filter(|(_, v)| !v.is_empty())
    }
}

/// Accumulates generated records and decides when to flush.
#[derive(Debug)]
pub struct BatchPartitioner {
    buffers: BTreeMap<Schema, Vec<FeedEntry>>,
    flush_threshold: usize,
}

impl BatchPartitioner {
    /// `flush_threshold` is the family-document count that triggers a
    /// flush; family documents are the per-document-cardinality schema, so
    /// the threshold bounds buffered documents rather than raw records.
    pub fn new(flush_threshold: usize) -> Self {
        Self {
            buffers: BTreeMap::new(),
            flush_threshold,
        }
    }

    /// Appends a record. When an incoming family document finds the buffer
    /// already holding `flush_threshold` family documents, the buffered
    /// cycle is flushed first and the new record starts the next one.
    pub fn push(&mut self, document: FeedDocument) -> Option<FeedBatch> {
        let batch = if document.schema == Schema::FamilyDocument
            && self.family_count() >= self.flush_threshold
        {
            self.take_batch()
        } else {
            None
        };

        self.buffers
            .entry(document.schema)
            .or_default()
            .push(FeedEntry {
                id: document.id,
                fields: document.fields,
            });

        batch
    }

    /// Final flush at generator exhaustion.
    pub fn finish(mut self) -> Option<FeedBatch> {
        self.take_batch()
    }

    fn family_count(&self) -> usize {
        self.buffers
            .get(&Schema::FamilyDocument)
            .map_or(0, Vec::len)
    }

    fn take_batch(&mut self) -> Option<FeedBatch> {
        if self.buffers.values().all(Vec::is_empty) {
            return None;
        }
        Some(FeedBatch {
            entries: std::mem::take(&mut self.buffers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(schema: Schema, id: &str) -> FeedDocument {
        FeedDocument {
            schema,
            id: id.to_string(),
            fields: json!({"id": id}),
        }
    }

    /// The generator's emission order for two documents with passages.
    fn two_document_stream() -> Vec<FeedDocument> {
        vec![
            record(Schema::SearchWeights, "default_weights"),
            record(Schema::FamilyDocument, "fam.1"),
            record(Schema::DocumentPassage, "doc.1.0"),
            record(Schema::DocumentPassage, "doc.1.1"),
            record(Schema::FamilyDocument, "fam.2"),
            record(Schema::DocumentPassage, "doc.2.0"),
        ]
    }

    #[test]
    fn test_two_documents_threshold_one_yields_two_flushes() {
        let mut partitioner = BatchPartitioner::new(1);
        let mut flushes = Vec::new();

        for document in two_document_stream() {
            if let Some(batch) = partitioner.push(document) {
                flushes.push(batch);
            }
        }
        if let Some(batch) = partitioner.finish() {
            flushes.push(batch);
        }

        assert_eq!(flushes.len(), 2);

        // First flush: weights plus the first document, whole.
        assert_eq!(flushes[0].entries(Schema::SearchWeights).len(), 1);
        assert_eq!(flushes[0].entries(Schema::FamilyDocument)[0].id, "fam.1");
        assert_eq!(flushes[0].entries(Schema::DocumentPassage).len(), 2);

        // Second flush: the second document only.
        assert_eq!(flushes[1].entries(Schema::SearchWeights).len(), 0);
        assert_eq!(flushes[1].entries(Schema::FamilyDocument)[0].id, "fam.2");
        assert_eq!(flushes[1].entries(Schema::DocumentPassage)[0].id, "doc.2.0");
    }

    #[test]
    fn test_flush_carries_whole_documents() {
        let mut partitioner = BatchPartitioner::new(1);

        assert!(partitioner
            .push(record(Schema::SearchWeights, "default_weights"))
            .is_none());
        assert!(partitioner
            .push(record(Schema::FamilyDocument, "fam.1"))
            .is_none());
        assert!(partitioner
            .push(record(Schema::DocumentPassage, "doc.1.0"))
            .is_none());

        // The next family document closes the cycle.
        let batch = partitioner
            .push(record(Schema::FamilyDocument, "fam.2"))
            .expect("incoming family document should flush the full buffer");

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.entries(Schema::FamilyDocument).len(), 1);
        assert_eq!(batch.entries(Schema::DocumentPassage).len(), 1);
    }

    #[test]
    fn test_threshold_two_buffers_two_documents() {
        let mut partitioner = BatchPartitioner::new(2);
        let mut flushes = 0;

        for document in two_document_stream() {
            if partitioner.push(document).is_some() {
                flushes += 1;
            }
        }
        // Both documents fit in one cycle; everything drains at the end.
        assert_eq!(flushes, 0);

        let batch = partitioner.finish().unwrap();
        assert_eq!(batch.entries(Schema::FamilyDocument).len(), 2);
        assert_eq!(batch.entries(Schema::DocumentPassage).len(), 3);
        assert_eq!(batch.len(), 6);
    }

    #[test]
    fn test_order_preserved_within_schema() {
        let mut partitioner = BatchPartitioner::new(10);
        for i in 0..5 {
            partitioner.push(record(Schema::DocumentPassage, &format!("doc.1.{}", i)));
        }

        let batch = partitioner.finish().unwrap();
        let ids: Vec<&str> = batch
            .entries(Schema::DocumentPassage)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["doc.1.0", "doc.1.1", "doc.1.2", "doc.1.3", "doc.1.4"]);
    }

    #[test]
    fn test_finish_empty_is_none() {
        let partitioner = BatchPartitioner::new(1);
        assert!(partitioner.finish().is_none());
    }

    #[test]
    fn test_schema_order_of_batch() {
        let mut partitioner = BatchPartitioner::new(10);
        partitioner.push(record(Schema::DocumentPassage, "doc.1.0"));
        partitioner.push(record(Schema::FamilyDocument, "fam.1"));
        partitioner.push(record(Schema::SearchWeights, "default_weights"));

        let schemas: Vec<Schema> = partitioner
            .finish()
            .unwrap()
            .into_schema_order()
            .map(|(schema, _)| schema)
            .collect();
        assert_eq!(
            schemas,
            vec![
                Schema::SearchWeights,
                Schema::FamilyDocument,
                Schema::DocumentPassage
            ]
        );
    }
}
