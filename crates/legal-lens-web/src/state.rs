use std::path::PathBuf;
use std::sync::Arc;

use legal_lens_core::{Analyzer, PdfBackend};

/// Shared application state accessible from all handlers.
///
/// Nothing in here is mutated by requests; the model client and PDF backend
/// are shared read-only.
pub struct AppState {
    pub analyzer: Analyzer,
    pub pdf_backend: Arc<dyn PdfBackend>,
    /// Parent directory for per-request temp dirs. `None` uses the system temp dir.
    pub upload_dir: Option<PathBuf>,
}
