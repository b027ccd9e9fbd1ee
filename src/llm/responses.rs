//! Client for the provider's `/responses` endpoint: hosted web search,
//! schema-constrained output and questions about uploaded files.

use bytes::Bytes;
use log::{ debug, info };
use reqwest::{ Client as HttpClient, multipart::{ Form, Part } };
use serde::{ Deserialize, Serialize };
use serde_json::{ json, Value as JsonValue };

use super::{ ensure_success, LlmConfig, ProviderError };
use crate::models::schema::StructuredOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    Medium,
    High,
}

impl SearchContextSize {
    /// Maps the UI's small/medium/large choice; anything else is medium.
    pub fn from_ui(value: Option<&str>) -> Self {
        match value {
            Some("small") => SearchContextSize::Low,
            Some("large") => SearchContextSize::High,
            _ => SearchContextSize::Medium,
        }
    }
}

#[derive(Deserialize)]
struct FileObject {
    id: String,
}

/// Concatenates every `output_text` part of every message in a responses
/// payload.
pub fn output_text(response: &JsonValue) -> String {
    let Some(items) = response.get("output").and_then(|o| o.as_array()) else {
        return String::new();
    };

    items
        .iter()
        .filter(|item| item.get("type").and_then(|t| t.as_str()) == Some("message"))
        .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
        .flatten()
        .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect()
}

pub struct OpenAIResponsesClient {
    http: HttpClient,
    config: LlmConfig,
}

impl OpenAIResponsesClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: config.http_client()?,
            config: config.clone(),
        })
    }

    async fn create(&self, body: &JsonValue) -> Result<JsonValue, ProviderError> {
        let resp = self.http.post(self.config.endpoint("/responses")).json(body).send().await?;
        Ok(ensure_success(resp).await?.json::<JsonValue>().await?)
    }

    /// Returns the summarized answer together with the raw provider payload.
    pub async fn web_search(
        &self,
        model: &str,
        query: &str,
        location: Option<&str>,
        context_size: SearchContextSize
    ) -> Result<(String, JsonValue), ProviderError> {
        let mut tool = json!({
            "type": "web_search_preview",
            "search_context_size": context_size,
        });
        if let Some(city) = location.map(str::trim).filter(|l| !l.is_empty()) {
            tool["user_location"] = json!({ "type": "approximate", "city": city });
        }

        info!("Web search with {} (context {:?})", model, context_size);
        let raw = self.create(&json!({ "model": model, "tools": [tool], "input": query })).await?;

        Ok((output_text(&raw), raw))
    }

    pub async fn parse<T: StructuredOutput>(&self, model: &str, input: &str) -> Result<T, ProviderError> {
        let body = json!({
            "model": model,
            "input": input,
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": T::NAME,
                    "schema": T::json_schema(),
                    "strict": true
                }
            }
        });

        let raw = self.create(&body).await?;
        let text = output_text(&raw);
        debug!("Structured output for '{}': {}", T::NAME, text);

        serde_json
            ::from_str(&text)
            .map_err(|e|
                ProviderError::InvalidResponse(format!("Output does not match '{}' schema: {}", T::NAME, e))
            )
    }

    pub async fn upload_file(
        &self,
        data: Bytes,
        file_name: &str,
        mime_type: Option<&str>
    ) -> Result<String, ProviderError> {
        let mut part = Part::bytes(data.to_vec()).file_name(file_name.to_string());
        if let Some(mime) = mime_type {
            part = part.mime_str(mime)?;
        }
        let form = Form::new().part("file", part).text("purpose", "user_data");

        let resp = self.http.post(self.config.endpoint("/files")).multipart(form).send().await?;
        let file = ensure_success(resp).await?.json::<FileObject>().await?;
        info!("Uploaded '{}' as {}", file_name, file.id);

        Ok(file.id)
    }

    pub async fn ask_about_file(
        &self,
        model: &str,
        file_id: &str,
        question: &str
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": model,
            "input": [{
                "role": "user",
                "content": [
                    { "type": "input_file", "file_id": file_id },
                    { "type": "input_text", "text": question }
                ]
            }]
        });

        Ok(output_text(&self.create(&body).await?))
    }
}
