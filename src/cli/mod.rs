use clap::Parser;

use crate::llm::{ LlmConfig, DEFAULT_OPENAI_BASE_URL };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- OpenAI Provider Args ---
    /// API key for the OpenAI API.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    /// Optional organization id sent as the OpenAI-Organization header.
    #[arg(long, env = "OPENAI_ORG_ID")]
    pub openai_org_id: Option<String>,

    /// Base URL for the OpenAI API (point at a proxy or mock if needed).
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    pub openai_base_url: String,

    // --- Model Defaults ---
    /// Chat model for the realtime relay when the request names none.
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-3.5-turbo")]
    pub chat_model: String,

    /// Chat model for the plain text stream.
    #[arg(long, env = "SIMPLE_CHAT_MODEL", default_value = "gpt-4o-mini")]
    pub simple_chat_model: String,

    /// Model for the completion tester and product copy.
    #[arg(long, env = "COMPLETION_MODEL", default_value = "gpt-4")]
    pub completion_model: String,

    /// Speech-to-text model.
    #[arg(long, env = "TRANSCRIPTION_MODEL", default_value = "whisper-1")]
    pub transcription_model: String,

    /// Text-to-speech model.
    #[arg(long, env = "TTS_MODEL", default_value = "tts-1")]
    pub tts_model: String,

    /// Voice used for synthesized speech.
    #[arg(long, env = "TTS_VOICE", default_value = "alloy")]
    pub tts_voice: String,

    /// Audio format for synthesized speech (mp3, opus, aac, flac, wav, pcm).
    #[arg(long, env = "TTS_FORMAT", default_value = "mp3")]
    pub tts_format: String,

    /// Image generation model.
    #[arg(long, env = "IMAGE_MODEL", default_value = "dall-e-2")]
    pub image_model: String,

    /// Vision model for image questions.
    #[arg(long, env = "VISION_MODEL", default_value = "gpt-4o")]
    pub vision_model: String,

    /// Model for web search and file questions.
    #[arg(long, env = "RESPONSES_MODEL", default_value = "gpt-4.1")]
    pub responses_model: String,

    /// Model for structured extraction when the request names none.
    #[arg(long, env = "PARSE_MODEL", default_value = "gpt-4o-2024-08-06")]
    pub parse_model: String,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Optional API Key required for clients. If set, clients must send it as X-API-Key or ?api_key=.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Requests per second accepted across all clients.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u32,

    /// Largest request body accepted, in bytes (audio clips and uploads included).
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "26214400")] // 25 MiB
    pub max_body_bytes: usize,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.openai_api_key.clone(),
            organization: self.openai_org_id.clone().filter(|o| !o.trim().is_empty()),
            base_url: self.openai_base_url.clone(),
        }
    }
}
