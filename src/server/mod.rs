pub mod api;
pub mod guard;
pub mod stream;

use crate::cli::Args;
use crate::llm::audio::OpenAIAudioClient;
use crate::llm::chat::OpenAIChatClient;
use crate::llm::images::OpenAIImageClient;
use crate::llm::responses::OpenAIResponsesClient;
use crate::relay::{ ChatRelay, SpeechSettings };

use axum::{ extract::DefaultBodyLimit, middleware, routing::post, Router };
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use log::{ info, warn, error };
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<OpenAIChatClient>,
    pub audio: Arc<OpenAIAudioClient>,
    pub images: Arc<OpenAIImageClient>,
    pub responses: Arc<OpenAIResponsesClient>,
    pub relay: Arc<ChatRelay>,
    pub limiter: Arc<GlobalRateLimiter>,
    pub args: Arc<Args>,
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config = args.llm_config();

        let chat = Arc::new(OpenAIChatClient::new(&config)?);
        let audio = Arc::new(
            OpenAIAudioClient::new(&config, args.transcription_model.clone(), args.tts_model.clone())?
        );
        let images = Arc::new(OpenAIImageClient::new(&config, args.image_model.clone())?);
        let responses = Arc::new(OpenAIResponsesClient::new(&config)?);

        let relay = Arc::new(
            ChatRelay::new(chat.clone(), audio.clone(), audio.clone(), SpeechSettings {
                voice: args.tts_voice.clone(),
                format: args.tts_format.clone(),
            })
        );

        let per_second = NonZeroU32::new(args.rate_limit_per_second).ok_or(
            "--rate-limit-per-second must be greater than zero"
        )?;
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            chat,
            audio,
            images,
            responses,
            relay,
            limiter,
            args: Arc::new(args.clone()),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let body_limit = state.args.max_body_bytes;

    Router::new()
        .route("/api/openai", post(api::completion_test_handler))
        .route("/api/openai/realtime-chat", post(stream::realtime_chat_handler))
        .route("/api/openai/simple-realtime-chat", post(stream::simple_chat_handler))
        .route("/api/openai/audio-transcribe", post(api::transcribe_handler))
        .route("/api/openai/audio-tts", post(api::speech_handler))
        .route("/api/openai/image-generation", post(api::image_generation_handler))
        .route("/api/openai/product-image-generator", post(api::product_image_handler))
        .route("/api/openai/product-description-generator", post(api::product_description_handler))
        .route("/api/openai/parse-event", post(api::parse_event_handler))
        .route("/api/openai/parse-cottage", post(api::parse_cottage_handler))
        .route("/api/openai/web-search", post(api::web_search_handler))
        .route("/api/openai/file-analyzer", post(api::file_analyzer_handler))
        .route("/api/openai/image-analyzer", post(api::image_analyzer_handler))
        .layer(middleware::from_fn_with_state(state.clone(), guard::guard))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

pub struct Server {
    addr: String,
    state: AppState,
}

impl Server {
    pub fn new(addr: String, state: AppState) -> Self {
        if state.args.server_api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Endpoints are open.");
        }

        Self { addr, state }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let args = self.state.args.clone();
        let app = router(self.state);

        if args.enable_tls {
            let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };

            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;

            info!("HTTPS server listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener
                ::bind(addr).await
                .map_err(|e| format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e))?;

            info!("HTTP server listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
