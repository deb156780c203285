//! Text extraction stage: turns an uploaded PDF on disk into document text.

use std::path::Path;
use std::sync::Arc;

use crate::backend::PdfBackend;

/// Extract the text of the PDF at `path`.
///
/// Any backend failure is logged and reported as an empty string, so callers
/// must read `""` as "extraction failed", not "the document is empty".
pub fn extract_text(backend: &dyn PdfBackend, path: &Path) -> String {
    match backend.extract_text(path) {
        Ok(text) => {
            tracing::debug!(path = %path.display(), chars = text.len(), "extracted document text");
            text
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "error reading pdf file");
            String::new()
        }
    }
}

/// Run [`extract_text`] on the blocking pool (PDF decoding is CPU-bound and not async).
pub async fn extract_text_blocking(backend: Arc<dyn PdfBackend>, path: &Path) -> String {
    let path = path.to_path_buf();
    match tokio::task::spawn_blocking(move || extract_text(backend.as_ref(), &path)).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "text extraction task failed");
            String::new()
        }
    }
}

/// Whether extracted text carries anything worth sending to the model.
///
/// Scanned documents without a text layer decode to whitespace only, which is
/// treated the same as a failed extraction.
pub fn is_unreadable(text: &str) -> bool {
    text.trim().is_empty()
}
