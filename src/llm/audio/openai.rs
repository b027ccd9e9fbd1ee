use async_trait::async_trait;
use bytes::Bytes;
use log::info;
use reqwest::{ Client as HttpClient, multipart::{ Form, Part } };
use serde::{ Deserialize, Serialize };

use super::{ AudioInput, SpeechToText, TextToSpeech };
use crate::llm::{ ensure_success, LlmConfig, ProviderError };

pub struct OpenAIAudioClient {
    http: HttpClient,
    config: LlmConfig,
    transcription_model: String,
    speech_model: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl OpenAIAudioClient {
    pub fn new(
        config: &LlmConfig,
        transcription_model: impl Into<String>,
        speech_model: impl Into<String>
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http: config.http_client()?,
            config: config.clone(),
            transcription_model: transcription_model.into(),
            speech_model: speech_model.into(),
        })
    }
}

#[async_trait]
impl SpeechToText for OpenAIAudioClient {
    async fn transcribe(&self, audio: AudioInput) -> Result<String, ProviderError> {
        info!(
            "Transcribing {} ({} bytes) with {}",
            audio.file_name,
            audio.data.len(),
            self.transcription_model
        );

        let part = Part::bytes(audio.data.to_vec()).file_name(audio.file_name).mime_str(&audio.mime_type)?;
        let form = Form::new().part("file", part).text("model", self.transcription_model.clone());

        let resp = self.http
            .post(self.config.endpoint("/audio/transcriptions"))
            .multipart(form)
            .send().await?;
        let parsed = ensure_success(resp).await?.json::<TranscriptionResponse>().await?;

        Ok(parsed.text)
    }
}

#[async_trait]
impl TextToSpeech for OpenAIAudioClient {
    async fn synthesize(&self, text: &str, voice: &str, format: &str) -> Result<Bytes, ProviderError> {
        info!("Synthesizing {} chars with {} ({}, {})", text.len(), self.speech_model, voice, format);

        let req = SpeechRequest {
            model: &self.speech_model,
            input: text,
            voice,
            response_format: format,
        };
        let resp = self.http.post(self.config.endpoint("/audio/speech")).json(&req).send().await?;

        Ok(ensure_success(resp).await?.bytes().await?)
    }
}
