//! Generative model trait and its implementations.

pub mod gemini;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod retry;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

pub use gemini::GeminiClient;
pub use retry::{RetryPolicy, generate_with_retry};

/// Errors from a generative model call.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("no API key configured for the generative model")]
    MissingApiKey,
    /// The call did not finish within the configured bound.
    #[error("upstream model timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("rate limited by the model service (429)")]
    RateLimited { retry_after: Option<Duration> },
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("HTTP request error: {0}")]
    Http(String),
    #[error("model service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("model returned no text")]
    EmptyResponse,
    #[error("could not decode model response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Timeout(_) | LlmError::RateLimited { .. } | LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::MissingApiKey | LlmError::EmptyResponse | LlmError::InvalidResponse(_) => {
                false
            }
        }
    }
}

/// A text-in, text-out generative model.
///
/// Implementations are shared across requests behind an `Arc`, so they must
/// not rely on per-call mutable state.
pub trait GenerativeModel: Send + Sync {
    /// Model identifier used in logs (e.g. "gemini-1.5-flash").
    fn name(&self) -> &str;

    /// Whether the model can be called at all (e.g. an API key is present).
    fn is_configured(&self) -> bool {
        true
    }

    /// Send `prompt` and return the generated text.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}
