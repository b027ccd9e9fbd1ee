pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod relay;
pub mod server;

use cli::Args;
use log::info;
use server::{ AppState, Server };
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("OpenAI Base URL: {}", args.openai_base_url);
    info!("OpenAI API Key: {}", if args.openai_api_key.is_empty() { "missing" } else { "set" });
    info!("OpenAI Organization: {}", args.openai_org_id.as_deref().unwrap_or("none"));
    info!("Chat Model: {}", args.chat_model);
    info!("Simple Chat Model: {}", args.simple_chat_model);
    info!("Completion Model: {}", args.completion_model);
    info!("Transcription Model: {}", args.transcription_model);
    info!("TTS Model: {} (voice {}, format {})", args.tts_model, args.tts_voice, args.tts_format);
    info!("Image Model: {}", args.image_model);
    info!("Vision Model: {}", args.vision_model);
    info!("Responses Model: {}", args.responses_model);
    info!("Parse Model: {}", args.parse_model);
    info!("Rate Limit: {} req/s", args.rate_limit_per_second);
    info!("Max Body Size: {} bytes", args.max_body_bytes);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let state = AppState::from_args(&args)?;
    info!("Starting server on: {}", args.server_addr);
    let server = Server::new(args.server_addr.clone(), state);
    server.run().await?;

    Ok(())
}
