use serde::{ Serialize, Deserialize };
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use super::chat::ChatMessage;
use crate::relay::frame::Framing;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub is_audio: bool,
    #[serde(default)]
    pub audio_data: Option<String>,
    #[serde(default)]
    pub framing: Framing,
}

#[derive(Deserialize, Debug)]
pub struct SimpleChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTestRequest {
    pub model: Option<String>,
    pub input: JsonValue,
    #[serde(default)]
    pub use_roles: bool,
}

#[derive(Deserialize, Debug)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: Option<String>,
    pub voice: Option<String>,
    pub format: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    pub size: Option<String>,
    pub output_format: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ProductImageRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub personality: String,
    #[serde(default)]
    pub platform: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProductBrief {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub audience: String,
    pub price: String,
    pub personality: String,
    #[serde(default)]
    pub formats: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct ParseRequest {
    pub model: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    pub location: Option<String>,
    pub context_size: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageQuestionRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct TranscriptionResponse {
    pub success: bool,
    pub transcription: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub image_url: String,
}

#[derive(Serialize, Debug)]
pub struct ImageGenerationResponse {
    pub success: bool,
    pub data: ImageData,
}

#[derive(Serialize, Debug)]
pub struct ImageUrlResponse {
    pub success: bool,
    pub url: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ProductCopyResponse {
    pub success: bool,
    pub content: BTreeMap<String, String>,
}

#[derive(Serialize, Debug)]
pub struct ParsedResponse<T> {
    pub success: bool,
    pub event: T,
}

#[derive(Serialize, Debug)]
pub struct WebSearchResponse {
    pub success: bool,
    pub processed: String,
    pub raw: JsonValue,
}

#[derive(Serialize, Debug)]
pub struct AnswerResponse {
    pub success: bool,
    pub answer: String,
}

#[derive(Serialize, Debug)]
pub struct RawDataResponse {
    pub success: bool,
    pub data: JsonValue,
}
