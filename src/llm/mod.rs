pub mod audio;
pub mod chat;
pub mod images;
pub mod responses;

use futures::Stream;
use log::warn;
use reqwest::{ Client as HttpClient, Response, header::{ HeaderMap, HeaderValue, AUTHORIZATION } };
use serde::Deserialize;
use std::pin::Pin;
use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
    },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub organization: Option<String>,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn endpoint(&self, route: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), route)
    }

    /// Builds the shared HTTP client with bearer auth and the optional
    /// organization header baked in.
    pub fn http_client(&self) -> Result<HttpClient, ProviderError> {
        if self.api_key.trim().is_empty() {
            warn!("OpenAI API key is empty; provider calls will be rejected upstream.");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e|
                ProviderError::Config(format!("Invalid API key format: {}", e))
            )?
        );
        if let Some(org) = self.organization.as_deref().filter(|o| !o.trim().is_empty()) {
            headers.insert(
                "OpenAI-Organization",
                HeaderValue::from_str(org).map_err(|e|
                    ProviderError::Config(format!("Invalid organization id: {}", e))
                )?
            );
        }

        HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(ProviderError::from)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Passes 2xx responses through and turns everything else into
/// `ProviderError::Api`, preferring the provider's own error message.
pub async fn ensure_success(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json
        ::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    Err(ProviderError::Api { status: status.as_u16(), message })
}
