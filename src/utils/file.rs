//! Helpers for reading parser output files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::ImportError;
use crate::models::ParsedDocument;

/// Reads every `.json` parser output under `dir`, sorted by path for a
/// deterministic processing order.
pub fn read_parser_outputs(dir: &Path) -> Result<Vec<ParsedDocument>, ImportError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let document: ParsedDocument =
            serde_json::from_str(&content).map_err(|source| ImportError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), document_id = %document.document_id, "read parser output");
        documents.push(document);
    }

    if documents.is_empty() {
        return Err(ImportError::NoDocuments);
    }

    Ok(documents)
}
