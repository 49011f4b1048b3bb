use super::request::{GenerationKind, GenerationRequest, GenerationResponse};
use super::traits::Backend;
use crate::error::BackendError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Deterministic canned backend for tests and offline dry runs.
///
/// With scripted responses, answers are popped in submission order; once
/// the script is exhausted (or absent) the stub falls back to canned
/// output derived from the request kind.
pub struct StubBackend {
    scripted: Mutex<VecDeque<String>>,
    /// Inflight batched requests waiting for `collect`.
    submitted: Mutex<Vec<GenerationRequest>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scripted: Mutex::new(responses.into_iter().map(Into::into).collect()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.scripted.lock().unwrap().push_back(response.into());
    }

    fn canned(kind: GenerationKind) -> String {
        match kind {
            GenerationKind::Outline => serde_json::json!({
                "title": "Working Draft",
                "thesis": "A placeholder thesis grounded in the corpus.",
                "classification": "general",
                "audience": "general",
                "sections": [
                    {"title": "Background", "description": "Context and definitions."},
                    {"title": "Current State", "description": "Where things stand."},
                    {"title": "Analysis", "description": "What the sources show."},
                    {"title": "Implications", "description": "What follows from it."},
                    {"title": "Conclusion", "description": "Summary and outlook."}
                ]
            })
            .to_string(),
            GenerationKind::Section | GenerationKind::Validation => {
                "Stub section text standing in for generated prose.".to_string()
            }
        }
    }

    fn answer(&self, request: &GenerationRequest) -> GenerationResponse {
        let content = self
            .scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Self::canned(request.kind));
        let completion_tokens = content.split_whitespace().count() as u64;
        GenerationResponse::stop(content)
            .with_usage(request.prompt.split_whitespace().count() as u64, completion_tokens)
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        Ok(self.answer(request))
    }

    fn supports_batching(&self) -> bool {
        true
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<(), BackendError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn collect(
        &self,
        id: super::request::RequestId,
    ) -> Result<GenerationResponse, BackendError> {
        let request = {
            let mut submitted = self.submitted.lock().unwrap();
            let index = submitted.iter().position(|r| r.id == id);
            match index {
                Some(index) => submitted.remove(index),
                None => return Err(BackendError::Timeout { id }),
            }
        };
        Ok(self.answer(&request))
    }
}
