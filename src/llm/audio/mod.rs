pub mod openai;

use async_trait::async_trait;
use bytes::Bytes;

use super::ProviderError;

pub use self::openai::OpenAIAudioClient;

/// An audio clip handed to speech-to-text, with the file name and MIME type
/// the provider uses to sniff its container.
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub data: Bytes,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioInput {
    /// Browser recordings arrive as WebM/Opus.
    pub fn webm(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            file_name: "audio.webm".to_string(),
            mime_type: "audio/webm".to_string(),
        }
    }
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: AudioInput) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, format: &str) -> Result<Bytes, ProviderError>;
}

/// Content type served for a synthesized clip in the given output format.
pub fn speech_content_type(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "opus" => "audio/ogg",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "pcm" => "audio/pcm",
        _ => "audio/mpeg",
    }
}
