//! Positioned text extraction from PDF documents.
//!
//! Produces the per-page [`TextFragment`] lists that the layout engine in
//! `doclayout_core` consumes. Page order follows the document's page tree
//! and every page gets an entry, text or not, so indices stay aligned.

use thiserror::Error;

use doclayout_core::TextFragment;
use parser::backend::{LopdfBackend, PdfBackend};

pub mod parser;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse PDF bytes into one fragment list per page.
pub fn extract_fragments(bytes: &[u8]) -> Result<Vec<Vec<TextFragment>>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    extract_document(&backend)
}

/// Read a PDF file and extract its fragments.
pub fn extract_file(path: impl AsRef<std::path::Path>) -> Result<Vec<Vec<TextFragment>>, PdfError> {
    let bytes = std::fs::read(path)?;
    extract_fragments(&bytes)
}

/// Walk every page of an already opened backend.
pub fn extract_document(backend: &dyn PdfBackend) -> Result<Vec<Vec<TextFragment>>, PdfError> {
    let pages = backend.pages();
    let mut result = Vec::with_capacity(pages.len());

    for (index, &page_id) in pages.values().enumerate() {
        result.push(parser::content::extract_page_fragments(
            backend, page_id, index,
        )?);
    }

    log::debug!(
        "extracted {} fragments from {} pages",
        result.iter().map(Vec::len).sum::<usize>(),
        result.len()
    );
    Ok(result)
}

/// Number of pages without walking any content stream.
pub fn page_count(bytes: &[u8]) -> Result<usize, PdfError> {
    Ok(LopdfBackend::load_bytes(bytes)?.page_count())
}
