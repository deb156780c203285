//! Mock generative model for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{GenerativeModel, LlmError};

/// Error kinds a [`MockModel`] can simulate.
#[derive(Clone, Debug)]
pub enum MockError {
    MissingApiKey,
    /// Transport failure (connection refused, reset, ...).
    Http,
    Api { status: u16 },
    Empty,
}

/// A configurable mock response for [`MockModel`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this text.
    Text(String),
    /// Simulate a 429 rate-limit response.
    RateLimited { retry_after: Option<Duration> },
    /// Simulate a failure.
    Error(MockError),
}

impl MockResponse {
    pub fn text(s: impl Into<String>) -> Self {
        MockResponse::Text(s.into())
    }

    fn into_result(self) -> Result<String, LlmError> {
        match self {
            MockResponse::Text(text) => Ok(text),
            MockResponse::RateLimited { retry_after } => Err(LlmError::RateLimited { retry_after }),
            MockResponse::Error(MockError::MissingApiKey) => Err(LlmError::MissingApiKey),
            MockResponse::Error(MockError::Http) => {
                Err(LlmError::Http("simulated network failure".into()))
            }
            MockResponse::Error(MockError::Api { status }) => Err(LlmError::Api {
                status,
                message: "simulated API error".into(),
            }),
            MockResponse::Error(MockError::Empty) => Err(LlmError::EmptyResponse),
        }
    }
}

type Responder = Box<dyn Fn(&str) -> MockResponse + Send + Sync>;

enum Script {
    /// Pops the next response (reversed storage); repeats `fallback` when exhausted.
    Sequence {
        responses: Mutex<Vec<MockResponse>>,
        fallback: MockResponse,
    },
    /// Computes the response from the prompt.
    Responder(Responder),
}

/// A hand-rolled mock implementing [`GenerativeModel`] for tests.
///
/// Supports:
/// - A fixed response (used for every call), **or**
/// - A sequence of responses (one per call, repeating the last if exhausted), **or**
/// - A closure choosing a response from the prompt.
/// - Optional per-call latency.
/// - Call counting and prompt recording.
pub struct MockModel {
    name: &'static str,
    script: Script,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    /// Create a mock that always returns `response`.
    pub fn new(name: &'static str, response: MockResponse) -> Self {
        Self::from_script(
            name,
            Script::Sequence {
                responses: Mutex::new(Vec::new()),
                fallback: response,
            },
        )
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(name: &'static str, mut responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        // Reverse so we can pop() from the front cheaply.
        responses.reverse();
        let fallback = responses[0].clone();
        Self::from_script(
            name,
            Script::Sequence {
                responses: Mutex::new(responses),
                fallback,
            },
        )
    }

    /// Create a mock whose response depends on the prompt.
    pub fn with_responder(
        name: &'static str,
        responder: impl Fn(&str) -> MockResponse + Send + Sync + 'static,
    ) -> Self {
        Self::from_script(name, Script::Responder(Box::new(responder)))
    }

    fn from_script(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            delay: None,
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Set simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `generate()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_response(&self, prompt: &str) -> MockResponse {
        match &self.script {
            Script::Sequence {
                responses,
                fallback,
            } => responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| fallback.clone()),
            Script::Responder(f) => f(prompt),
        }
    }
}

impl GenerativeModel for MockModel {
    fn name(&self) -> &str {
        self.name
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let response = self.next_response(prompt);
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            response.into_result()
        })
    }
}
