use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use tempfile::TempDir;

use crate::error::ApiError;

/// Multipart field names accepted for the document.
const FILE_FIELDS: [&str; 2] = ["uploaded_file", "file"];

/// PDF readers accept the `%PDF-` header anywhere in this many leading bytes.
const PDF_HEADER_WINDOW: usize = 1024;

/// An uploaded document with its data and original filename.
pub struct UploadedDocument {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Parse a multipart form upload, returning the first document field.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedDocument, ApiError> {
    let mut document: Option<UploadedDocument> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        if document.is_none() && FILE_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().unwrap_or("upload.pdf").to_string();
            let data = field.bytes().await.map_err(multipart_error)?.to_vec();
            document = Some(UploadedDocument { filename, data });
        } else {
            // Drain unknown fields
            let _ = field.bytes().await.map_err(multipart_error)?;
        }
    }

    let document = document.ok_or(ApiError::NoFile)?;
    if !looks_like_pdf(&document.data) {
        return Err(ApiError::NotPdf);
    }
    Ok(document)
}

/// Whether `data` carries a PDF header within its first 1024 bytes.
///
/// Whether the document is actually readable is left to text extraction.
fn looks_like_pdf(data: &[u8]) -> bool {
    data[..data.len().min(PDF_HEADER_WINDOW)]
        .windows(5)
        .any(|w| w == b"%PDF-")
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::InvalidUpload(e.body_text())
    }
}

/// A document persisted to its own temporary directory.
///
/// The path is `<random dir>/upload.pdf`, independent of the client's
/// filename, so concurrent uploads never collide. The directory is removed
/// by [`TempUpload::cleanup`], or on drop if the request ends any other way.
pub struct TempUpload {
    dir: TempDir,
    path: PathBuf,
}

impl TempUpload {
    pub async fn create(parent: Option<&Path>, data: &[u8]) -> Result<Self, ApiError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("legal-lens-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| ApiError::Internal(format!("failed to create temp directory: {}", e)))?;

        let path = dir.path().join("upload.pdf");
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to write temp file: {}", e)))?;

        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the temp directory, logging (not propagating) failures.
    pub fn cleanup(self) {
        let dir_path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(path = %dir_path.display(), error = %e, "failed to remove temp upload");
        } else {
            tracing::debug!(path = %dir_path.display(), "removed temp upload");
        }
    }
}
