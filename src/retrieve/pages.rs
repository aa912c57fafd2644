//! Loader for pre-extracted source pages.
//!
//! Ingestion happens elsewhere; its hand-off is a JSON array of
//! `{"page": 12, "text": "...", "section_header": "..."}` objects.

use crate::error::{RegassistError, Result};
use crate::retrieve::EvidenceChunk;
use std::path::Path;

pub fn load_pages(path: &Path) -> Result<Vec<EvidenceChunk>> {
    let raw = std::fs::read_to_string(path)?;
    let pages: Vec<EvidenceChunk> = serde_json::from_str(&raw)?;
    if pages.iter().all(|p| p.text.trim().is_empty()) && !pages.is_empty() {
        return Err(RegassistError::InvalidInput(format!(
            "{} contains only empty pages",
            path.display()
        )));
    }
    log::info!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}
