//! Loading per-document embedding matrices.
//!
//! The embedding generator persists one `.npy` artifact per document, named
//! `{document_id}.npy`: row 0 is the document summary vector, rows 1..N the
//! vectors of the retained text blocks in order.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use ndarray::Array2;
use ndarray_npy::ReadNpyExt;

use crate::error::EmbeddingError;

/// Reads embedding matrices from a directory of `.npy` artifacts.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dir: PathBuf,
}

impl EmbeddingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}.npy", document_id))
    }

    /// Loads the matrix for one document. Any failure here is fatal for the
    /// run: the artifact is produced by the same pipeline that produced the
    /// parser output, so its absence is an upstream defect.
    pub fn load(&self, document_id: &str) -> Result<Array2<f32>, EmbeddingError> {
        let path = self.artifact_path(document_id);
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EmbeddingError::Missing {
                    document_id: document_id.to_string(),
                    path: path.clone(),
                }
            } else {
                EmbeddingError::Unreadable {
                    document_id: document_id.to_string(),
                    source: e,
                }
            }
        })?;

        Array2::<f32>::read_npy(BufReader::new(file)).map_err(|e| EmbeddingError::Malformed {
            document_id: document_id.to_string(),
            source: e,
        })
    }
}
