use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};

use legal_lens_core::{AnalysisResult, extract_text_blocking, is_unreadable};

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::{self, TempUpload};

/// Handler: POST /simplify_document
///
/// Upload → save → extract text → summarize → extract clauses → validate.
/// The temp upload is removed on every exit path once it has been saved.
pub async fn simplify_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let document = upload::parse_multipart(multipart).await?;
    tracing::info!(
        filename = %document.filename,
        bytes = document.data.len(),
        "received document"
    );

    let temp = TempUpload::create(state.upload_dir.as_deref(), &document.data).await?;
    drop(document);

    let result = analyze_saved(&state, &temp).await;
    temp.cleanup();

    result.map(Json)
}

async fn analyze_saved(state: &AppState, temp: &TempUpload) -> Result<AnalysisResult, ApiError> {
    let text = extract_text_blocking(state.pdf_backend.clone(), temp.path()).await;

    // Skip both model calls when there is nothing to analyze.
    if is_unreadable(&text) {
        return Err(ApiError::Unreadable);
    }

    Ok(state.analyzer.analyze(&text).await?)
}
