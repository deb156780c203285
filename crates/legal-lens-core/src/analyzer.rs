//! Summary and clause extraction stages.
//!
//! Both stages absorb model failures: the summarizer substitutes a fixed
//! notice and the clause extractor substitutes a fixed, parseable JSON
//! document. Only a malformed clause response escapes as an error, from
//! [`Analyzer::analyze`].

use std::sync::Arc;

use crate::AnalysisResult;
use crate::clauses::{ClauseCategory, ClauseParseError, parse_clauses, strip_fences};
use crate::llm::{GenerativeModel, RetryPolicy, generate_with_retry};
use crate::prompts::{clause_prompt, summary_prompt};

/// Summary returned when the model could not produce one.
pub const SUMMARY_FAILED: &str =
    "Failed to get summary due to an error while contacting the AI service.";

/// Notice placed under "liability" when clause extraction could not run.
pub const CLAUSES_FAILED: &str =
    "Error: clauses could not be extracted because the AI service was unavailable.";

/// JSON returned by [`Analyzer::extract_clauses`] when the model call fails.
pub fn clause_fallback_json() -> String {
    let mut map = serde_json::Map::new();
    for category in ClauseCategory::ALL {
        let items = if category == ClauseCategory::Liability {
            vec![serde_json::Value::String(CLAUSES_FAILED.to_string())]
        } else {
            Vec::new()
        };
        map.insert(category.key().to_string(), serde_json::Value::Array(items));
    }
    serde_json::Value::Object(map).to_string()
}

/// Runs the two model-backed stages against a shared model handle.
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn GenerativeModel>,
    policy: RetryPolicy,
}

impl Analyzer {
    pub fn new(model: Arc<dyn GenerativeModel>, policy: RetryPolicy) -> Self {
        Self { model, policy }
    }

    pub fn model(&self) -> &dyn GenerativeModel {
        self.model.as_ref()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Plain-language summary of `text`, or [`SUMMARY_FAILED`].
    pub async fn summarize(&self, text: &str) -> String {
        let prompt = summary_prompt(text);
        match generate_with_retry(self.model.as_ref(), &prompt, &self.policy).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(model = self.model.name(), error = %e, "summary generation failed");
                SUMMARY_FAILED.to_string()
            }
        }
    }

    /// Fence-stripped clause JSON for `text`.
    ///
    /// The result is not validated; it is whatever the model produced, or
    /// [`clause_fallback_json`] if the call failed.
    pub async fn extract_clauses(&self, text: &str) -> String {
        let prompt = clause_prompt(text);
        match generate_with_retry(self.model.as_ref(), &prompt, &self.policy).await {
            Ok(raw) => strip_fences(&raw).to_string(),
            Err(e) => {
                tracing::error!(model = self.model.name(), error = %e, "clause extraction failed");
                clause_fallback_json()
            }
        }
    }

    /// Summary first, then clauses, then validation of the clause JSON.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, ClauseParseError> {
        let summary = self.summarize(text).await;
        let raw_clauses = self.extract_clauses(text).await;
        let clauses = parse_clauses(&raw_clauses)?;
        tracing::info!(
            summary_chars = summary.len(),
            clauses = clauses.total(),
            "document analyzed"
        );
        Ok(AnalysisResult { summary, clauses })
    }
}
