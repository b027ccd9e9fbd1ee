use async_trait::async_trait;
use futures::StreamExt;
use log::{ debug, warn };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use serde_json::{ json, Value as JsonValue };

use super::{ create_streaming_response, ChatClient };
use crate::llm::{ ensure_success, LlmConfig, ProviderError, TextStream };
use crate::models::chat::ChatMessage;

pub struct OpenAIChatClient {
    http: HttpClient,
    config: LlmConfig,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    error: Option<OpenAIStreamError>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
}

#[derive(Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIStreamError {
    message: String,
}

/// What a single server-sent-event line means for the relay.
#[derive(Debug, PartialEq)]
pub(crate) enum SseEvent {
    Delta(String),
    Done,
    Error(String),
    Skip,
}

pub(crate) fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let data = data.trim();
    if data.is_empty() {
        return SseEvent::Skip;
    }
    if data == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<OpenAIStreamResponse>(data) {
        Ok(resp) => {
            if let Some(err) = resp.error {
                return SseEvent::Error(err.message);
            }
            let text: String = resp.choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            if text.is_empty() { SseEvent::Skip } else { SseEvent::Delta(text) }
        }
        Err(e) => {
            warn!("Skipping unparsable stream line: {} ({})", data, e);
            SseEvent::Skip
        }
    }
}

/// Collects raw body bytes and hands back complete lines. Lines split across
/// network chunks (or across a multi-byte character) are held until their
/// newline arrives.
#[derive(Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            lines.push(line.trim_end_matches('\r').to_string());
        }
        lines
    }

    pub(crate) fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = String::from_utf8_lossy(&self.pending).trim_end_matches('\r').to_string();
        self.pending.clear();
        Some(rest)
    }
}

impl OpenAIChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: config.http_client()?,
            config: config.clone(),
        })
    }

    /// Forwards a chat completion body untouched and returns the provider's
    /// JSON as is.
    pub async fn create_raw(&self, body: &JsonValue) -> Result<JsonValue, ProviderError> {
        let resp = self.http.post(self.config.endpoint("/chat/completions")).json(body).send().await?;
        Ok(ensure_success(resp).await?.json::<JsonValue>().await?)
    }

    pub async fn legacy_completion(
        &self,
        model: &str,
        prompt: &JsonValue,
        max_tokens: u32
    ) -> Result<JsonValue, ProviderError> {
        let body = json!({
            "model": model,
            "prompt": prompt,
            "max_tokens": max_tokens,
        });
        let resp = self.http.post(self.config.endpoint("/completions")).json(&body).send().await?;
        Ok(ensure_success(resp).await?.json::<JsonValue>().await?)
    }

    /// Asks a vision model a question about an image reachable by URL (or a
    /// data URL). `None` when the model answers with no content.
    pub async fn ask_about_image(
        &self,
        model: &str,
        question: &str,
        image_url: &str,
        max_tokens: u32
    ) -> Result<Option<String>, ProviderError> {
        let body = json!({
            "model": model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": question },
                    { "type": "image_url", "image_url": { "url": image_url } }
                ]
            }],
            "max_tokens": max_tokens,
        });
        let resp = self.http.post(self.config.endpoint("/chat/completions")).json(&body).send().await?;
        let parsed = ensure_success(resp).await?.json::<OpenAIResponse>().await?;

        Ok(
            parsed.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.is_empty())
        )
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: Option<u32>
    ) -> Result<String, ProviderError> {
        let req = OpenAIChatRequest {
            model,
            messages,
            max_tokens,
            stream: None,
        };

        let resp = self.http.post(self.config.endpoint("/chat/completions")).json(&req).send().await?;
        let parsed = ensure_success(resp).await?.json::<OpenAIResponse>().await?;

        parsed.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in completion response".into()))
    }

    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage]
    ) -> Result<TextStream, ProviderError> {
        let req = OpenAIChatRequest {
            model,
            messages,
            max_tokens: None,
            stream: Some(true),
        };

        let resp = self.http.post(self.config.endpoint("/chat/completions")).json(&req).send().await?;
        let resp = ensure_success(resp).await?;

        Ok(
            create_streaming_response(move |tx| async move {
                let mut bytes = resp.bytes_stream();
                let mut lines = SseLineBuffer::default();

                while let Some(chunk) = bytes.next().await {
                    let chunk = match chunk {
                        Ok(c) => c,
                        Err(e) => {
                            let _ = tx.send(Err(ProviderError::Http(e))).await;
                            return;
                        }
                    };
                    debug!("OpenAI raw chunk: {} bytes", chunk.len());

                    for line in lines.push(&chunk) {
                        match parse_sse_line(&line) {
                            SseEvent::Delta(text) => {
                                if tx.send(Ok(text)).await.is_err() {
                                    return;
                                }
                            }
                            SseEvent::Done => {
                                return;
                            }
                            SseEvent::Error(message) => {
                                let _ = tx.send(Err(ProviderError::Api { status: 200, message })).await;
                                return;
                            }
                            SseEvent::Skip => {}
                        }
                    }
                }

                if let Some(line) = lines.finish() {
                    if let SseEvent::Delta(text) = parse_sse_line(&line) {
                        let _ = tx.send(Ok(text)).await;
                    }
                }
            })
        )
    }
}
