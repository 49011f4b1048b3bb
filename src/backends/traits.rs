use super::request::{GenerationRequest, GenerationResponse, RequestId};
use crate::error::BackendError;
use async_trait::async_trait;

/// A backend turns a prompt into generated text. The orchestrator never
/// knows which variant answers: a canned stub, a human at a terminal, an
/// external actor exchanging files, or a network API.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    /// Submit a request and block until its response is available or the
    /// backend's deadline elapses.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResponse, BackendError>;

    /// Whether `submit`/`collect` may be used to enqueue several requests
    /// before blocking.
    fn supports_batching(&self) -> bool {
        false
    }

    /// Enqueue a request without waiting for its answer.
    async fn submit(&self, request: &GenerationRequest) -> Result<(), BackendError> {
        let _ = request;
        Err(BackendError::BatchingUnsupported {
            backend: self.name().to_string(),
        })
    }

    /// Block until the response for a previously submitted id is available.
    /// Responses may arrive in any order; correlation is by id alone.
    async fn collect(&self, id: RequestId) -> Result<GenerationResponse, BackendError> {
        let _ = id;
        Err(BackendError::BatchingUnsupported {
            backend: self.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::request::GenerationKind;

    struct TextOnly;

    #[async_trait]
    impl Backend for TextOnly {
        fn name(&self) -> &str {
            "text-only"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GenerationResponse, BackendError> {
            Ok(GenerationResponse::stop("ok"))
        }
    }

    #[tokio::test]
    async fn default_batching_surface_is_unsupported() {
        let backend = TextOnly;
        let request = GenerationRequest::new(1, GenerationKind::Outline, "x");

        assert!(!backend.supports_batching());
        assert!(matches!(
            backend.submit(&request).await,
            Err(BackendError::BatchingUnsupported { .. })
        ));
        assert!(matches!(
            backend.collect(1).await,
            Err(BackendError::BatchingUnsupported { .. })
        ));
    }
}
