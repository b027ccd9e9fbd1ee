pub mod openai;

use async_trait::async_trait;
use futures::Future;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ ProviderError, TextStream };
use crate::models::chat::ChatMessage;

pub use self::openai::OpenAIChatClient;

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: Option<u32>
    ) -> Result<String, ProviderError>;

    /// Opens a streamed completion. An `Err` here means nothing was produced;
    /// errors after that arrive as items of the returned stream.
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage]
    ) -> Result<TextStream, ProviderError>;
}

/// Runs `response_fn` on its own task and exposes whatever it sends as a
/// stream. The task sees a send error once the consumer is dropped.
pub fn create_streaming_response<F, Fut>(response_fn: F) -> TextStream
    where
        F: FnOnce(mpsc::Sender<Result<String, ProviderError>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        response_fn(tx).await;
    });

    Box::pin(ReceiverStream::new(rx))
}
