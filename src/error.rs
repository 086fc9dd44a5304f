//! Error types for the indexer.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::models::Schema;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    Path(String),

    /// Every detected issue, reported together rather than one at a time.
    #[error("configuration issues found: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Errors related to reading parser output files.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no parser output files found")]
    NoDocuments,
}

/// Errors loading per-document embedding artifacts. Always fatal for the
/// run: a missing or malformed artifact means the upstream embedding stage
/// broke its contract, not that one document is quirky.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding artifact for {document_id} not found at {}", .path.display())]
    Missing { document_id: String, path: PathBuf },

    #[error("failed to read embedding artifact for {document_id}: {source}")]
    Unreadable {
        document_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed embedding artifact for {document_id}: {source}")]
    Malformed {
        document_id: String,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    #[error(
        "embedding matrix for {document_id} has {rows} rows, expected {expected} \
         (summary row plus one row per retained text block)"
    )]
    RowMismatch {
        document_id: String,
        rows: usize,
        expected: usize,
    },
}

/// Errors correcting text block coordinates. Recoverable: the affected
/// document falls back to its uncorrected coordinates.
#[derive(Debug, Clone, Error)]
pub enum GeometryError {
    #[error("text block {text_block_id} has coordinates but no page number")]
    MissingPageNumber { text_block_id: String },

    #[error("no page dimensions for page {page_number} (text block {text_block_id})")]
    MissingPageDimensions {
        page_number: u32,
        text_block_id: String,
    },
}

/// Errors building index records.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("embedding for {id} has {actual} dimensions, expected {expected}")]
    EmbeddingDim {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to serialize {schema} record {id}: {source}")]
    Serialize {
        schema: Schema,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while generating index records.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// A single rejected feed entry, as reported by the index.
#[derive(Debug, Clone)]
pub struct FeedFailure {
    pub schema: Schema,
    pub id: String,
    pub status: u16,
    pub body: Value,
}

/// Errors related to bulk submission.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("TLS identity error: {0}")]
    Tls(String),

    #[error("failed to connect to index: {0}")]
    Connection(String),

    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Raised once per flush, after every schema in the flush has been
    /// attempted, carrying every error-class response.
    #[error("indexing failed: {} entries rejected", .failures.len())]
    SubmissionFailed { failures: Vec<FeedFailure> },
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("import error: {0}")]
    Import(#[from] ImportError),

    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}
