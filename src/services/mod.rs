mod batch;
mod embeddings;
mod feed;
mod filter;
mod generator;
mod geometry;
mod partitioner;

pub use batch::{PopulateStats, feed_documents};
pub use embeddings::EmbeddingStore;
pub use feed::{BulkSubmitter, FeedResponse, FeedTransport, IndexClient};
pub use filter::filter_on_block_type;
pub use generator::{DocumentGenerator, FeedDocument};
pub use geometry::{BlockCorrection, correct_block_geometry};
pub use partitioner::{BatchPartitioner, FeedBatch, FeedEntry};
