use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing sequence id, unique for the lifetime of one
/// generation run. Never reused: a retry after a timeout allocates a
/// fresh id.
pub type RequestId = u64;

/// Allocates request ids for one generation run.
#[derive(Debug)]
pub struct RequestSequence {
    next: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> RequestId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GenerationKind {
    Outline,
    Section,
    Validation,
}

/// One unit of work handed to a backend. Created by the orchestrator and,
/// for the file exchange, written to the request queue exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: RequestId,
    pub kind: GenerationKind,
    pub prompt: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl GenerationRequest {
    pub fn new(id: RequestId, kind: GenerationKind, prompt: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            prompt: prompt.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

/// Wire payload written by whichever backend variant answers a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub content: String,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    pub finish_reason: FinishReason,
}

impl GenerationResponse {
    pub fn stop(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            prompt_tokens: 0,
            completion_tokens: 0,
            finish_reason: FinishReason::Stop,
        }
    }

    pub fn with_usage(mut self, prompt_tokens: u64, completion_tokens: u64) -> Self {
        self.prompt_tokens = prompt_tokens;
        self.completion_tokens = completion_tokens;
        self
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}
