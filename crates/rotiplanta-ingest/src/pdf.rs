//! PDF text extraction.

use std::path::Path;

use tracing::{debug, error};

use rotiplanta_core::{Error, Result};

/// Text of every page of the PDF at `path`, joined by newlines and trimmed.
///
/// Parsing is CPU-bound, so it runs on the blocking pool. A parser panic
/// surfaces as an extraction error.
pub async fn extract_pdf_text(path: &Path) -> Result<String> {
    let owned = path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
        .await
        .map_err(|e| Error::Extraction(format!("Failed to extract text from PDF: {}", e)))?
        .map_err(|e| {
            error!("Failed to extract text from {}: {}", path.display(), e);
            Error::Extraction(format!("Failed to extract text from PDF: {}", e))
        })?;

    debug!("Extracted {} page(s) from {}", pages.len(), path.display());
    Ok(join_pages(&pages))
}

/// Blank pages contribute nothing.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|page| page.as_ref())
        .filter(|page| !page.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
        .trim()
        .to_string()
}
