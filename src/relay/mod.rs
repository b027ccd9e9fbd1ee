pub mod frame;
pub mod history;

use base64::{ engine::general_purpose::STANDARD as BASE64, Engine as _ };
use bytes::Bytes;
use futures::{ Stream, StreamExt };
use log::{ info, warn, error };
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::llm::audio::{ AudioInput, SpeechToText, TextToSpeech };
use crate::llm::chat::ChatClient;
use crate::llm::{ ProviderError, TextStream };
use crate::models::chat::ChatMessage;
use self::frame::{ Framing, AUDIO_END, AUDIO_START };
use self::history::HistoryWindow;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Transcription failed: {0}")]
    Transcription(#[source] ProviderError),

    #[error("Chat completion failed: {0}")]
    Completion(#[source] ProviderError),

    #[error("Text-to-speech failed: {0}")]
    Synthesis(#[source] ProviderError),
}

pub type RelayStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;

#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub is_audio: bool,
    /// Base64 audio clip; only read when `is_audio` is set.
    pub audio_data: Option<String>,
    /// `None` forwards the conversation untrimmed.
    pub window: Option<HistoryWindow>,
    pub framing: Framing,
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub voice: String,
    pub format: String,
}

/// Streams a chat completion back to the caller and, in audio mode,
/// transcribes the incoming clip and appends synthesized speech once the
/// text is complete.
pub struct ChatRelay {
    chat: Arc<dyn ChatClient>,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    speech: SpeechSettings,
}

impl ChatRelay {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        speech: SpeechSettings
    ) -> Self {
        Self { chat, stt, tts, speech }
    }

    /// Does everything that can fail before the first byte is sent:
    /// validation, transcription, trimming and opening the upstream stream.
    /// The returned stream owns the rest.
    pub async fn open(&self, request: RelayRequest) -> Result<RelayStream, RelayError> {
        let relay_id = Uuid::new_v4();
        let RelayRequest { model, mut messages, is_audio, audio_data, window, framing } = request;

        if messages.is_empty() {
            return Err(RelayError::InvalidRequest("No messages provided".into()));
        }

        info!(
            "[{}] relay request: model={}, messages={}, audio={}, has_audio_data={}",
            relay_id,
            model,
            messages.len(),
            is_audio,
            audio_data.is_some()
        );

        if is_audio {
            if let Some(encoded) = audio_data.as_deref().filter(|d| !d.is_empty()) {
                let clip = BASE64
                    .decode(encoded)
                    .map_err(|e| RelayError::InvalidRequest(format!("Invalid audioData: {}", e)))?;
                let transcript = self.stt
                    .transcribe(AudioInput::webm(clip)).await
                    .map_err(RelayError::Transcription)?;
                info!("[{}] transcribed {} chars", relay_id, transcript.len());
                messages.push(ChatMessage::user(transcript));
            }
        }

        let outbound = match window {
            Some(w) => w.trim(&messages).to_vec(),
            None => messages,
        };

        info!("[{}] starting chat completion with {} messages", relay_id, outbound.len());
        let upstream = self.chat.stream_chat(&model, &outbound).await.map_err(RelayError::Completion)?;

        let speech = if is_audio { Some((Arc::clone(&self.tts), self.speech.clone())) } else { None };
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(pump(relay_id, upstream, tx, speech, framing));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

async fn pump(
    relay_id: Uuid,
    mut upstream: TextStream,
    tx: mpsc::Sender<Result<Bytes, RelayError>>,
    speech: Option<(Arc<dyn TextToSpeech>, SpeechSettings)>,
    framing: Framing
) {
    let mut full_response = String::new();

    loop {
        let item = tokio::select! {
            _ = tx.closed() => {
                info!("[{}] client disconnected while waiting on completion", relay_id);
                return;
            }
            item = upstream.next() => item,
        };
        let Some(item) = item else {
            break;
        };

        match item {
            Ok(fragment) => {
                full_response.push_str(&fragment);
                if tx.send(Ok(framing.text(&fragment))).await.is_err() {
                    info!("[{}] client disconnected during text relay", relay_id);
                    return;
                }
            }
            Err(e) => {
                error!("[{}] completion stream failed: {}", relay_id, e);
                let _ = tx.send(Err(RelayError::Completion(e))).await;
                return;
            }
        }
    }

    if
        framing == Framing::Sentinel &&
        (full_response.contains(AUDIO_START.trim_start()) ||
            full_response.contains(AUDIO_END.trim_start()))
    {
        warn!("[{}] response text contains an audio marker; sentinel clients may misparse it", relay_id);
    }

    let Some((tts, settings)) = speech else {
        return;
    };

    info!("[{}] starting text-to-speech for {} chars", relay_id, full_response.len());
    let synthesized = tokio::select! {
        _ = tx.closed() => {
            info!("[{}] client disconnected before speech was ready", relay_id);
            return;
        }
        result = tts.synthesize(&full_response, &settings.voice, &settings.format) => result,
    };

    match synthesized {
        Ok(audio) => {
            for chunk in framing.audio(&audio) {
                if tx.send(Ok(chunk)).await.is_err() {
                    return;
                }
            }
            info!("[{}] text-to-speech completed ({} bytes)", relay_id, audio.len());
        }
        Err(e) => {
            error!("[{}] text-to-speech failed: {}", relay_id, e);
            let _ = tx.send(Err(RelayError::Synthesis(e))).await;
        }
    }
}
