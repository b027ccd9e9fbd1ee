use log::info;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ ensure_success, LlmConfig, ProviderError };

/// Sizes dall-e-2 accepts.
pub const ALLOWED_SIZES: [&str; 3] = ["256x256", "512x512", "1024x1024"];
pub const DEFAULT_SIZE: &str = "1024x1024";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageResponseFormat {
    Url,
    B64Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    Url(String),
    Base64(String),
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    response_format: ImageResponseFormat,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

pub fn normalize_size(size: Option<&str>) -> &'static str {
    size.and_then(|s| ALLOWED_SIZES.iter().find(|allowed| **allowed == s).copied()).unwrap_or(
        DEFAULT_SIZE
    )
}

pub fn image_mime_type(output_format: Option<&str>) -> &'static str {
    match output_format {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

pub struct OpenAIImageClient {
    http: HttpClient,
    config: LlmConfig,
    model: String,
}

impl OpenAIImageClient {
    pub fn new(config: &LlmConfig, model: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http: config.http_client()?,
            config: config.clone(),
            model: model.into(),
        })
    }

    pub async fn generate(
        &self,
        prompt: &str,
        size: &str,
        format: ImageResponseFormat
    ) -> Result<GeneratedImage, ProviderError> {
        info!("Generating {} image with {}", size, self.model);

        let req = ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size,
            response_format: format,
        };
        let resp = self.http.post(self.config.endpoint("/images/generations")).json(&req).send().await?;
        let parsed = ensure_success(resp).await?.json::<ImageGenerationResponse>().await?;

        let datum = parsed.data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("Image response contained no data".into()))?;

        match (format, datum.url, datum.b64_json) {
            (ImageResponseFormat::Url, Some(url), _) => Ok(GeneratedImage::Url(url)),
            (ImageResponseFormat::B64Json, _, Some(b64)) => Ok(GeneratedImage::Base64(b64)),
            _ => Err(ProviderError::InvalidResponse("Image response missing requested field".into())),
        }
    }
}
