//! Drives the generate → partition → submit loop for one run.

use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::models::{ParsedDocument, Schema};
use crate::services::feed::{BulkSubmitter, FeedTransport};
use crate::services::generator::DocumentGenerator;
use crate::services::partitioner::BatchPartitioner;

/// Counters reported after a populate run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PopulateStats {
    pub documents: u64,
    pub passages: u64,
    pub records: u64,
    pub flushes: u64,
    pub duration_ms: u64,
}

/// Pulls records from the generator, buffers them by schema, and submits
/// each flushed batch before pulling further. Generation errors abort
/// before the next submission; submission errors abort after the current
/// flush.
pub async fn feed_documents<I, T>(
    generator: DocumentGenerator<I>,
    mut partitioner: BatchPartitioner,
    submitter: &BulkSubmitter<T>,
) -> Result<PopulateStats, AppError>
where
    I: Iterator<Item = ParsedDocument>,
    T: FeedTransport,
{
    let mut stats = PopulateStats::default();

    for item in generator {
        let document = item?;
        match document.schema {
            Schema::FamilyDocument => stats.documents += 1,
            Schema::DocumentPassage => stats.passages += 1,
            Schema::SearchWeights => {}
        }
        stats.records += 1;

        if let Some(batch) = partitioner.push(document) {
            let accepted = submitter.submit(batch).await?;
            stats.flushes += 1;
            info!(flush = stats.flushes, accepted, "flushed batch to index");
        }
    }

    if let Some(batch) = partitioner.finish() {
        let accepted = submitter.submit(batch).await?;
        stats.flushes += 1;
        info!(flush = stats.flushes, accepted, "flushed final batch to index");
    }

    Ok(stats)
}
