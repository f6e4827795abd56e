//! Retrying generation client.

use super::retry::{with_retry, RetryConfig, RetryError};
use super::{GenerationRequest, TextGenerator};
use crate::errors::{GenerationError, UpstreamError};
use async_trait::async_trait;

/// A single, unretried call to the remote generation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Sends one request and returns the generated text.
    async fn send(&self, request: &GenerationRequest) -> Result<String, UpstreamError>;
}

/// A [`TextGenerator`] that retries transient overload failures.
///
/// Overload (status 529 or an "overloaded" message) is retried with
/// exponential backoff up to the configured attempt budget, then reported as
/// [`GenerationError::ServiceUnavailable`]. Any other failure is returned
/// unchanged on the first occurrence. Requests are read-only, so repeating
/// the identical payload is safe.
#[derive(Debug)]
pub struct RetryingGenerator<T> {
    transport: T,
    retry: RetryConfig,
}

impl<T: ModelTransport> RetryingGenerator<T> {
    /// Creates a retrying generator.
    pub fn new(transport: T, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }
}

#[async_trait]
impl<T: ModelTransport> TextGenerator for RetryingGenerator<T> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        with_retry(&self.retry, &request.model, UpstreamError::is_overloaded, || {
            self.transport.send(request)
        })
        .await
        .map_err(|err| match err {
            RetryError::Exhausted { attempts, .. } => GenerationError::service_unavailable(attempts),
            RetryError::Permanent(e) => GenerationError::Upstream(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SERVICE_UNAVAILABLE_MESSAGE;
    use crate::generation::Message;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "test-model".to_string(),
            max_tokens: 64,
            system: "system".to_string(),
            messages: vec![Message::user("hello")],
        }
    }

    fn fast_retry(max_attempts: usize) -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(max_attempts)
            .with_base_delay_ms(1)
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let mut transport = MockModelTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_send()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(UpstreamError::with_status(529, "Overloaded")));
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("generated".to_string()));

        let generator = RetryingGenerator::new(transport, fast_retry(3));
        let text = generator.generate(&request()).await.unwrap();

        assert_eq!(text, "generated");
    }

    #[tokio::test]
    async fn test_exhaustion_raises_single_clean_error() {
        let mut transport = MockModelTransport::new();
        transport
            .expect_send()
            .times(3)
            .returning(|_| Err(UpstreamError::new(None, "{\"error\":{\"type\":\"overloaded_error\"}}")));

        let generator = RetryingGenerator::new(transport, fast_retry(3));
        let err = generator.generate(&request()).await.unwrap_err();

        assert_eq!(err, GenerationError::service_unavailable(3));
        assert_eq!(err.to_string(), SERVICE_UNAVAILABLE_MESSAGE);
        assert!(!err.to_string().contains("overloaded_error"));
    }

    #[tokio::test]
    async fn test_permanent_failure_propagates_unchanged() {
        let upstream = UpstreamError::with_status(401, "invalid x-api-key");
        let returned = upstream.clone();

        let mut transport = MockModelTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(move |_| Err(returned.clone()));

        let generator = RetryingGenerator::new(transport, fast_retry(5));
        let err = generator.generate(&request()).await.unwrap_err();

        assert_eq!(err, GenerationError::Upstream(upstream));
    }

    #[tokio::test]
    async fn test_payload_is_identical_across_retries() {
        let expected = request();
        let mut transport = MockModelTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_send()
            .withf(move |req| *req == expected)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(UpstreamError::with_status(529, "busy")));
        let expected = request();
        transport
            .expect_send()
            .withf(move |req| *req == expected)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("ok".to_string()));

        let generator = RetryingGenerator::new(transport, fast_retry(2));
        assert_eq!(generator.generate(&request()).await.unwrap(), "ok");
    }
}
