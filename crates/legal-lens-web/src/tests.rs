//! End-to-end tests for the HTTP surface.
//!
//! The router is driven in-process with `oneshot`. The model is a
//! [`MockModel`] and the PDF backend is a stub that reads the saved temp file
//! and returns whatever follows the `%PDF-1.4\n` header, so each test controls
//! the "extracted" text through the upload body itself.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use legal_lens_core::llm::mock::{MockError, MockModel, MockResponse};
use legal_lens_core::{
    Analyzer, BackendError, CLAUSES_FAILED, GenerativeModel, LlmError, PdfBackend, RetryPolicy,
    SUMMARY_FAILED,
};

use crate::app;
use crate::error::{INTERNAL_DETAIL, MALFORMED_DETAIL, UNREADABLE_DETAIL};
use crate::state::AppState;

const PDF_HEADER: &[u8] = b"%PDF-1.4\n";
const BOUNDARY: &str = "legal-lens-test-boundary";

const SCENARIO_CLAUSES: &str =
    r#"{"liability":["X shall indemnify Y"],"termination":[],"confidentiality":[]}"#;

/// Returns the bytes after the PDF header as text; `CORRUPT` simulates a decode failure.
#[derive(Default)]
struct EchoBackend {
    seen: Mutex<Vec<PathBuf>>,
}

impl EchoBackend {
    fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl PdfBackend for EchoBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        self.seen.lock().unwrap().push(path.to_path_buf());
        let data = std::fs::read(path)?;
        let body = data.strip_prefix(PDF_HEADER).unwrap_or(&data);
        if body == b"CORRUPT" {
            return Err(BackendError::OpenError("corrupt xref table".into()));
        }
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

/// A model that panics, standing in for an unclassified failure.
struct PanickingModel;

impl GenerativeModel for PanickingModel {
    fn name(&self) -> &str {
        "panicking"
    }

    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        panic!("model exploded")
    }
}

struct Harness {
    app: Router,
    backend: Arc<EchoBackend>,
    upload_dir: tempfile::TempDir,
}

impl Harness {
    fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self::with_limit(model, 1024 * 1024)
    }

    fn with_limit(model: Arc<dyn GenerativeModel>, max_upload_bytes: usize) -> Self {
        let backend = Arc::new(EchoBackend::default());
        let upload_dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState {
            analyzer: Analyzer::new(model, RetryPolicy::no_retry(Duration::from_secs(5))),
            pdf_backend: backend.clone(),
            upload_dir: Some(upload_dir.path().to_path_buf()),
        });
        let origins = vec!["http://localhost:3000".to_string()];
        Self {
            app: app::router(state, &origins, max_upload_bytes),
            backend,
            upload_dir,
        }
    }

    async fn post_document(&self, text: &str) -> (StatusCode, serde_json::Value) {
        let mut data = PDF_HEADER.to_vec();
        data.extend_from_slice(text.as_bytes());
        self.post_raw("uploaded_file", "contract.pdf", &data).await
    }

    async fn post_raw(
        &self,
        field: &str,
        filename: &str,
        data: &[u8],
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/simplify_document")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field, filename, data)))
            .unwrap();
        send(&self.app, request).await
    }

    /// Number of entries left in the upload directory.
    fn leftover_uploads(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    write!(
        body,
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
    )
    .unwrap();
    body.extend_from_slice(data);
    write!(body, "\r\n--{BOUNDARY}--\r\n").unwrap();
    body
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn sequence(responses: Vec<MockResponse>) -> Arc<MockModel> {
    Arc::new(MockModel::with_sequence("mock", responses))
}

/// Answers clause prompts with `clauses` and everything else with `summary`.
fn routed(summary: &'static str, clauses: &'static str) -> Arc<MockModel> {
    Arc::new(MockModel::with_responder("mock", move |prompt| {
        if prompt.contains("\"liability\"") {
            MockResponse::text(clauses)
        } else {
            MockResponse::text(summary)
        }
    }))
}

// ── scenarios ──────────────────────────────────────────────────────────

#[tokio::test]
async fn text_bearing_pdf_returns_summary_and_clauses() {
    let model = routed("This contract obligates...", SCENARIO_CLAUSES);
    let h = Harness::new(model.clone());

    let (status, body) = h.post_document("X shall indemnify Y.").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "summary": "This contract obligates...",
            "clauses": {
                "liability": ["X shall indemnify Y"],
                "termination": [],
                "confidentiality": []
            }
        })
    );
    assert_eq!(model.call_count(), 2);
    assert!(model.prompts().iter().all(|p| p.contains("X shall indemnify Y.")));
}

#[tokio::test]
async fn empty_text_is_400_without_model_calls() {
    let model = routed("unused", SCENARIO_CLAUSES);
    let h = Harness::new(model.clone());

    let (status, body) = h.post_document("").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], UNREADABLE_DETAIL);
    assert!(body["detail"].as_str().unwrap().contains("unreadable"));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn whitespace_only_text_is_unreadable() {
    let model = routed("unused", SCENARIO_CLAUSES);
    let h = Harness::new(model.clone());

    let (status, _) = h.post_document("  \n\n \t").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn corrupt_pdf_is_unreadable() {
    let model = routed("unused", SCENARIO_CLAUSES);
    let h = Harness::new(model.clone());

    let (status, body) = h.post_document("CORRUPT").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], UNREADABLE_DETAIL);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn fenced_clauses_missing_keys_are_normalized() {
    let model = routed("Summary", "```json\n{\"liability\":[]}\n```");
    let h = Harness::new(model);

    let (status, body) = h.post_document("Some contract text").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["clauses"],
        serde_json::json!({"liability": [], "termination": [], "confidentiality": []})
    );
}

#[tokio::test]
async fn non_json_clauses_are_500() {
    let model = routed("Summary", "not json at all");
    let h = Harness::new(model.clone());

    let (status, body) = h.post_document("Some contract text").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], MALFORMED_DETAIL);
    assert!(body["detail"].as_str().unwrap().contains("structure"));
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn wrongly_typed_clauses_are_500() {
    let model = routed("Summary", r#"{"liability":"none","termination":[],"confidentiality":[]}"#);
    let h = Harness::new(model);

    let (status, body) = h.post_document("Some contract text").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], MALFORMED_DETAIL);
    assert!(body.get("clauses").is_none());
}

#[tokio::test]
async fn summary_failure_still_returns_clauses() {
    let model = sequence(vec![
        MockResponse::Error(MockError::Http),
        MockResponse::text(SCENARIO_CLAUSES),
    ]);
    let h = Harness::new(model.clone());

    let (status, body) = h.post_document("X shall indemnify Y.").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], SUMMARY_FAILED);
    assert_eq!(
        body["clauses"]["liability"],
        serde_json::json!(["X shall indemnify Y"])
    );
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn clause_failure_returns_fallback_notice() {
    let model = sequence(vec![
        MockResponse::text("A summary"),
        MockResponse::Error(MockError::Api { status: 503 }),
    ]);
    let h = Harness::new(model);

    let (status, body) = h.post_document("Some contract text").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "A summary");
    assert_eq!(body["clauses"]["liability"], serde_json::json!([CLAUSES_FAILED]));
    assert_eq!(body["clauses"]["termination"], serde_json::json!([]));
}

#[tokio::test]
async fn unconfigured_model_degrades_gracefully() {
    let model = Arc::new(MockModel::new(
        "mock",
        MockResponse::Error(MockError::MissingApiKey),
    ));
    let h = Harness::new(model);

    let (status, body) = h.post_document("Some contract text").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], SUMMARY_FAILED);
    assert_eq!(body["clauses"]["liability"], serde_json::json!([CLAUSES_FAILED]));
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let h = Harness::new(routed("This contract obligates...", SCENARIO_CLAUSES));

    let first = h.post_document("Same document").await;
    let second = h.post_document("Same document").await;

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(first, second);
}

// ── cleanup ────────────────────────────────────────────────────────────

#[tokio::test]
async fn temp_file_removed_after_every_outcome() {
    let h = Harness::new(routed("Summary", SCENARIO_CLAUSES));
    assert_eq!(h.post_document("ok").await.0, StatusCode::OK);
    assert_eq!(h.post_document("").await.0, StatusCode::BAD_REQUEST);

    let failing = Harness::new(routed("Summary", "not json at all"));
    assert_eq!(
        failing.post_document("text").await.0,
        StatusCode::INTERNAL_SERVER_ERROR
    );

    for harness in [&h, &failing] {
        let seen = harness.backend.seen();
        assert!(!seen.is_empty());
        for path in seen {
            assert!(!path.exists(), "{} was not cleaned up", path.display());
        }
        assert_eq!(harness.leftover_uploads(), 0);
    }
}

#[tokio::test]
async fn panic_is_generic_500_and_still_cleans_up() {
    let h = Harness::new(Arc::new(PanickingModel));

    let (status, body) = h.post_document("Some contract text").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], INTERNAL_DETAIL);
    assert!(!body.to_string().contains("exploded"));
    assert_eq!(h.leftover_uploads(), 0);
}

#[tokio::test]
async fn same_filename_gets_distinct_temp_paths() {
    let h = Harness::new(routed("Summary", SCENARIO_CLAUSES));
    h.post_document("one").await;
    h.post_document("two").await;

    let seen = h.backend.seen();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0], seen[1]);
    for path in &seen {
        assert!(!path.to_string_lossy().contains("contract.pdf"));
    }
}

// ── upload validation ──────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_field_is_400() {
    let model = routed("unused", SCENARIO_CLAUSES);
    let h = Harness::new(model.clone());

    let (status, body) = h.post_raw("something_else", "a.pdf", b"%PDF-1.4\nx").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No file uploaded");
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn file_alias_field_is_accepted() {
    let h = Harness::new(routed("Summary", SCENARIO_CLAUSES));
    let (status, _) = h.post_raw("file", "a.pdf", b"%PDF-1.4\ntext").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn non_pdf_upload_is_400() {
    let model = routed("unused", SCENARIO_CLAUSES);
    let h = Harness::new(model.clone());

    let (status, body) = h.post_raw("uploaded_file", "notes.txt", b"just some text").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Uploaded file is not a PDF");
    assert_eq!(model.call_count(), 0);
    assert!(h.backend.seen().is_empty());
}

#[tokio::test]
async fn pdf_with_leading_bytes_reaches_extraction() {
    let h = Harness::new(routed("Summary", SCENARIO_CLAUSES));

    let (status, body) = h
        .post_raw("uploaded_file", "bom.pdf", b"\xEF\xBB\xBF%PDF-1.4\nX shall indemnify Y.")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Summary");
    assert_eq!(h.backend.seen().len(), 1);
    assert_eq!(h.leftover_uploads(), 0);
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let h = Harness::with_limit(routed("unused", SCENARIO_CLAUSES), 1024);

    let mut data = PDF_HEADER.to_vec();
    data.extend(std::iter::repeat_n(b'a', 8 * 1024));
    let (status, _) = h.post_raw("uploaded_file", "big.pdf", &data).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(h.leftover_uploads(), 0);
}

// ── health & CORS ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_model() {
    let h = Harness::new(routed("unused", SCENARIO_CLAUSES));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "mock");
    assert_eq!(body["model_configured"], true);
}

async fn preflight(app: &Router, origin: &str) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/simplify_document")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let h = Harness::new(routed("unused", SCENARIO_CLAUSES));

    let response = preflight(&h.app, "http://localhost:3000").await;
    let headers = response.headers();

    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "POST"
    );
}

#[tokio::test]
async fn cors_rejects_other_origins() {
    let h = Harness::new(routed("unused", SCENARIO_CLAUSES));

    let response = preflight(&h.app, "https://evil.example").await;

    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
