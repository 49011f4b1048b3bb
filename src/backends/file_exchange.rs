use super::exchange::{RequestQueue, ResponseQueue};
use super::request::{GenerationRequest, GenerationResponse, RequestId};
use super::traits::Backend;
use crate::config::ExchangeConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

/// Backend satisfied by an external actor (human or automation) that
/// communicates exclusively through files in two well-known directories.
///
/// Per-request lifecycle: PENDING (request file written, no response) ->
/// ANSWERED (response file observed and parsed) -> CONSUMED (response file
/// removed, value returned); or PENDING -> TIMED_OUT, in which case the
/// request file is retained so a late or resumed responder can still
/// answer it. The caller must not wait on a timed-out id again; retries
/// allocate a fresh id.
pub struct FileExchangeBackend {
    requests: RequestQueue,
    responses: ResponseQueue,
    poll_interval: Duration,
    response_timeout: Duration,
    /// Caps every poll wait in the run, not just a single call.
    run_deadline: Option<Instant>,
}

impl FileExchangeBackend {
    pub fn new(workspace_dir: &Path, config: &ExchangeConfig) -> Result<Self, BackendError> {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                workspace_dir.join(path)
            }
        };

        Ok(Self {
            requests: RequestQueue::new(resolve(&config.requests_dir))?,
            responses: ResponseQueue::new(resolve(&config.responses_dir))?,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            response_timeout: Duration::from_secs(config.response_timeout_secs),
            run_deadline: config
                .run_deadline_secs
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        })
    }

    pub fn request_queue(&self) -> &RequestQueue {
        &self.requests
    }

    pub fn response_queue(&self) -> &ResponseQueue {
        &self.responses
    }

    fn call_deadline(&self) -> Instant {
        let per_call = Instant::now() + self.response_timeout;
        match self.run_deadline {
            Some(run) if run < per_call => run,
            _ => per_call,
        }
    }

    /// Poll the response queue for `id` until consumed or the deadline
    /// elapses. Never spins: each miss sleeps a fixed interval.
    async fn await_response(&self, id: RequestId) -> Result<GenerationResponse, BackendError> {
        let deadline = self.call_deadline();

        loop {
            match self.responses.take(id) {
                Ok(Some(response)) => return Ok(response),
                Ok(None) => {}
                Err(BackendError::MalformedResponse { id, detail }) => {
                    // Retry policy belongs to the orchestrator, not the
                    // transport: a malformed payload is logged, archived by
                    // the queue, and reported as a timeout.
                    tracing::warn!(request_id = id, %detail, "malformed response payload");
                    return Err(BackendError::Timeout { id });
                }
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(BackendError::Timeout { id });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Backend for FileExchangeBackend {
    fn name(&self) -> &str {
        "file-exchange"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        self.submit(request).await?;
        self.collect(request.id).await
    }

    fn supports_batching(&self) -> bool {
        true
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<(), BackendError> {
        self.requests.enqueue(request)?;
        tracing::debug!(
            request_id = request.id,
            kind = %request.kind,
            "request enqueued"
        );
        Ok(())
    }

    async fn collect(&self, id: RequestId) -> Result<GenerationResponse, BackendError> {
        let response = self.await_response(id).await?;
        // Consumed: drain the matching request file.
        self.requests.remove(id)?;
        Ok(response)
    }
}
