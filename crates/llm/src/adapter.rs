//! Language Model adapter
//!
//! Bridges the LlmBackend trait to the core LanguageModel trait.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use lead_agent_core::{
    Error, FinishReason as CoreFinishReason, GenerateRequest, LanguageModel, Result, StreamChunk,
};

use crate::backend::{FinishReason as BackendFinishReason, GenerationOptions, LlmBackend};
use crate::LlmError;

/// Adapter that wraps an LlmBackend to implement the core LanguageModel trait
///
/// The backend runs on its own task and feeds a channel; the returned stream
/// owns that task and aborts it when dropped, which closes the provider
/// connection if the client goes away mid-response.
pub struct LanguageModelAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl LanguageModelAdapter {
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self { backend, model_name }
    }

    fn convert_finish_reason(reason: BackendFinishReason) -> CoreFinishReason {
        match reason {
            BackendFinishReason::Stop => CoreFinishReason::Stop,
            BackendFinishReason::Length => CoreFinishReason::Length,
            BackendFinishReason::Error | BackendFinishReason::Cancelled => CoreFinishReason::Error,
        }
    }
}

/// Aborts the generation task when the consuming stream is dropped
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[async_trait]
impl LanguageModel for LanguageModelAdapter {
    fn generate_stream<'a>(
        &'a self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + 'a>> {
        let backend = self.backend.clone();

        Box::pin(async_stream::stream! {
            let (tx, mut rx) = mpsc::channel::<String>(100);

            let options = GenerationOptions {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            };
            let stream_task = tokio::spawn(async move {
                backend
                    .generate_stream(&request.system, &request.messages, options, tx)
                    .await
            });
            let _abort = AbortOnDrop(stream_task.abort_handle());

            while let Some(text) = rx.recv().await {
                yield Ok(StreamChunk::text(text));
            }

            match stream_task.await {
                Ok(Ok(result)) => {
                    let reason = Self::convert_finish_reason(result.finish_reason);
                    yield Ok(StreamChunk::final_chunk(reason));
                }
                Ok(Err(LlmError::Cancelled)) => {
                    tracing::debug!("Generation cancelled by consumer");
                }
                Ok(Err(e)) => {
                    yield Err(Error::from(e));
                }
                Err(e) => {
                    yield Err(Error::Llm(format!("Task join error: {}", e)));
                }
            }
        })
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerationResult;
    use futures::StreamExt;
    use lead_agent_core::Message;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct MockBackend {
        chunks: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate_stream(
            &self,
            _system: &str,
            _messages: &[Message],
            _options: GenerationOptions,
            tx: mpsc::Sender<String>,
        ) -> std::result::Result<GenerationResult, LlmError> {
            for chunk in &self.chunks {
                tx.send(chunk.to_string()).await.map_err(|_| LlmError::Cancelled)?;
            }
            if self.fail {
                return Err(LlmError::Api("HTTP 529: overloaded".to_string()));
            }
            Ok(GenerationResult {
                text: self.chunks.concat(),
                tokens: self.chunks.len(),
                time_to_first_token_ms: 1,
                total_time_ms: 2,
                finish_reason: BackendFinishReason::Stop,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    /// Streams one chunk then waits forever, recording whether it was dropped
    struct HangingBackend {
        dropped: Arc<AtomicBool>,
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl LlmBackend for HangingBackend {
        async fn generate_stream(
            &self,
            _system: &str,
            _messages: &[Message],
            _options: GenerationOptions,
            tx: mpsc::Sender<String>,
        ) -> std::result::Result<GenerationResult, LlmError> {
            let _guard = SetOnDrop(self.dropped.clone());
            let _ = tx.send("partial".to_string()).await;
            futures::future::pending::<()>().await;
            unreachable!()
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "hanging"
        }
    }

    #[tokio::test]
    async fn test_stream_yields_chunks_then_final() {
        let adapter = LanguageModelAdapter::new(MockBackend {
            chunks: vec!["Hello", ", ", "world"],
            fail: false,
        });
        assert_eq!(adapter.model_name(), "mock");

        let chunks: Vec<_> = adapter
            .generate_stream(GenerateRequest::new("sys").with_user_message("hi"))
            .collect()
            .await;

        assert_eq!(chunks.len(), 4);
        let text: String = chunks[..3]
            .iter()
            .map(|c| c.as_ref().unwrap().delta.clone())
            .collect();
        assert_eq!(text, "Hello, world");
        let last = chunks[3].as_ref().unwrap();
        assert!(last.is_final);
        assert_eq!(last.finish_reason, Some(CoreFinishReason::Stop));
    }

    /// Records the options it was called with
    struct RecordingBackend {
        seen: parking_lot::Mutex<Option<GenerationOptions>>,
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        async fn generate_stream(
            &self,
            _system: &str,
            _messages: &[Message],
            options: GenerationOptions,
            _tx: mpsc::Sender<String>,
        ) -> std::result::Result<GenerationResult, LlmError> {
            *self.seen.lock() = Some(options);
            Ok(GenerationResult {
                text: String::new(),
                tokens: 0,
                time_to_first_token_ms: 0,
                total_time_ms: 0,
                finish_reason: BackendFinishReason::Stop,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_request_options_reach_backend() {
        let backend = Arc::new(RecordingBackend {
            seen: parking_lot::Mutex::new(None),
        });
        let adapter = LanguageModelAdapter::from_arc(backend.clone());

        let request = GenerateRequest::new("sys")
            .with_user_message("hi")
            .with_max_tokens(256)
            .with_temperature(0.2);
        let _: Vec<_> = adapter.generate_stream(request).collect().await;

        assert_eq!(
            *backend.seen.lock(),
            Some(GenerationOptions {
                max_tokens: Some(256),
                temperature: Some(0.2),
            })
        );
    }

    #[tokio::test]
    async fn test_backend_error_becomes_err_item() {
        let adapter = LanguageModelAdapter::new(MockBackend {
            chunks: vec!["partial"],
            fail: true,
        });

        let chunks: Vec<_> = adapter
            .generate_stream(GenerateRequest::new("sys").with_user_message("hi"))
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert!(matches!(chunks[1], Err(Error::Llm(_))));
    }

    #[tokio::test]
    async fn test_dropping_stream_aborts_generation() {
        let dropped = Arc::new(AtomicBool::new(false));
        let adapter = LanguageModelAdapter::new(HangingBackend {
            dropped: dropped.clone(),
        });

        {
            let mut stream =
                adapter.generate_stream(GenerateRequest::new("sys").with_user_message("hi"));
            let first = stream.next().await.unwrap().unwrap();
            assert_eq!(first.delta, "partial");
        }

        for _ in 0..50 {
            if dropped.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(dropped.load(Ordering::SeqCst));
    }
}
