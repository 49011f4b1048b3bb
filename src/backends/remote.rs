use super::request::{FinishReason, GenerationRequest, GenerationResponse};
use super::traits::Backend;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Direct network backend speaking the OpenAI-compatible chat completions
/// protocol, which most hosted and self-hosted inference servers accept.
pub struct RemoteApiBackend {
    base_url: String,
    model: String,
    temperature: f64,
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl RemoteApiBackend {
    pub fn new(
        base_url: Option<&str>,
        api_key: Option<&str>,
        model: &str,
        temperature: f64,
    ) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            temperature,
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(std::time::Duration::from_secs(90))
                .tcp_keepalive(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn map_finish_reason(raw: Option<&str>) -> FinishReason {
        match raw {
            Some("stop") | None => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            _ => FinishReason::Error,
        }
    }

    async fn call_api(&self, request: &GenerationRequest) -> Result<ChatResponse, BackendError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature: self.temperature,
        };
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut http_request = self.client.post(&url).json(&body);
        if let Some(auth) = &self.cached_auth_header {
            http_request = http_request.header("Authorization", auth);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| BackendError::Request {
                backend: "remote".into(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let trimmed: String = body.chars().take(200).collect();
            return Err(BackendError::Request {
                backend: "remote".into(),
                message: format!("HTTP {status}: {trimmed}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse {
                id: request.id,
                detail: e.to_string(),
            })
    }
}

#[async_trait]
impl Backend for RemoteApiBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let chat = self.call_api(request).await?;
        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::MalformedResponse {
                id: request.id,
                detail: "response carried no choices".into(),
            })?;

        let mut generation = GenerationResponse::stop(choice.message.content.unwrap_or_default());
        generation.finish_reason = Self::map_finish_reason(choice.finish_reason.as_deref());
        if let Some(usage) = chat.usage {
            generation = generation.with_usage(usage.prompt_tokens, usage.completion_tokens);
        }
        Ok(generation)
    }
}
