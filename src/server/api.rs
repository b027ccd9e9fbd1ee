use axum::{
    extract::{ rejection::JsonRejection, Multipart, State },
    http::header,
    response::{ IntoResponse, Response },
    Json,
};
use bytes::Bytes;
use log::info;
use serde_json::json;
use std::collections::BTreeMap;

use super::AppState;
use crate::config::prompt::{
    product_copy_prompt,
    product_image_prompt,
    COPYWRITER_SYSTEM_PROMPT,
    PRODUCT_COPY_MAX_TOKENS,
};
use crate::error::ApiError;
use crate::llm::audio::{ speech_content_type, AudioInput, SpeechToText, TextToSpeech };
use crate::llm::chat::ChatClient;
use crate::llm::images::{ image_mime_type, normalize_size, GeneratedImage, ImageResponseFormat };
use crate::llm::responses::SearchContextSize;
use crate::models::api::*;
use crate::models::chat::ChatMessage;
use crate::models::schema::{ CalendarEvent, PropertyListing, StructuredOutput };

const TESTER_MAX_TOKENS: u32 = 1000;
const IMAGE_QUESTION_MAX_TOKENS: u32 = 1000;
const PRODUCT_IMAGE_SIZE: &str = "512x512";

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// An uploaded multipart file.
struct Upload {
    data: Bytes,
    file_name: Option<String>,
    content_type: Option<String>,
}

pub async fn completion_test_handler(
    State(state): State<AppState>,
    payload: Result<Json<CompletionTestRequest>, JsonRejection>
) -> Result<Json<RawDataResponse>, ApiError> {
    let Json(req) = payload?;
    let model = non_blank(req.model).unwrap_or_else(|| state.args.completion_model.clone());

    let data = if req.use_roles {
        state.chat.create_raw(&json!({ "model": model, "messages": req.input })).await?
    } else {
        state.chat.legacy_completion(&model, &req.input, TESTER_MAX_TOKENS).await?
    };

    Ok(Json(RawDataResponse { success: true, data }))
}

pub async fn transcribe_handler(
    State(state): State<AppState>,
    mut multipart: Multipart
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("audio") {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            upload = Some(Upload { data: field.bytes().await?, file_name, content_type });
        }
    }

    let upload = upload
        .filter(|u| !u.data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No audio file provided".into()))?;

    let mut input = AudioInput::webm(upload.data);
    if let Some(name) = upload.file_name {
        input.file_name = name;
    }
    if let Some(mime) = upload.content_type {
        input.mime_type = mime;
    }

    let transcription = state.audio.transcribe(input).await?;
    Ok(Json(TranscriptionResponse { success: true, transcription }))
}

pub async fn speech_handler(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let text = req.text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No text provided".into()))?;
    let voice = non_blank(req.voice).unwrap_or_else(|| state.args.tts_voice.clone());
    let format = non_blank(req.format).unwrap_or_else(|| state.args.tts_format.clone());

    let audio = state.audio.synthesize(&text, &voice, &format).await?;

    Ok(
        (
            [
                (header::CONTENT_TYPE, speech_content_type(&format).to_string()),
                (header::CONTENT_DISPOSITION, format!("inline; filename=\"speech.{}\"", format)),
            ],
            audio,
        ).into_response()
    )
}

pub async fn image_generation_handler(
    State(state): State<AppState>,
    payload: Result<Json<ImageGenerationRequest>, JsonRejection>
) -> Result<Json<ImageGenerationResponse>, ApiError> {
    let Json(req) = payload?;
    let prompt = non_blank(req.prompt).ok_or_else(|| ApiError::BadRequest("No prompt provided".into()))?;
    let size = normalize_size(req.size.as_deref());

    let image = state.images.generate(&prompt, size, ImageResponseFormat::B64Json).await?;
    let image_url = match image {
        GeneratedImage::Base64(b64) => {
            format!("data:{};base64,{}", image_mime_type(req.output_format.as_deref()), b64)
        }
        GeneratedImage::Url(url) => url,
    };

    Ok(Json(ImageGenerationResponse { success: true, data: ImageData { image_url } }))
}

pub async fn product_image_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProductImageRequest>, JsonRejection>
) -> Result<Json<ImageUrlResponse>, ApiError> {
    let Json(req) = payload?;
    let prompt = product_image_prompt(&req);

    let url = match state.images.generate(&prompt, PRODUCT_IMAGE_SIZE, ImageResponseFormat::Url).await? {
        GeneratedImage::Url(url) => Some(url),
        GeneratedImage::Base64(_) => None,
    };

    Ok(Json(ImageUrlResponse { success: true, url }))
}

pub async fn product_description_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProductBrief>, JsonRejection>
) -> Result<Json<ProductCopyResponse>, ApiError> {
    let Json(brief) = payload?;
    let model = &state.args.completion_model;
    let mut content = BTreeMap::new();

    for format in &brief.formats {
        let messages = [
            ChatMessage::system(COPYWRITER_SYSTEM_PROMPT),
            ChatMessage::user(product_copy_prompt(&brief, format)),
        ];
        info!("Generating '{}' copy for {}", format, brief.name);
        let text = state.chat.complete(model, &messages, Some(PRODUCT_COPY_MAX_TOKENS)).await?;
        content.insert(format.clone(), text);
    }

    Ok(Json(ProductCopyResponse { success: true, content }))
}

async fn parse_structured<T: StructuredOutput>(
    state: &AppState,
    req: ParseRequest
) -> Result<Json<ParsedResponse<T>>, ApiError> {
    let input = non_blank(req.input).ok_or_else(|| ApiError::BadRequest("Missing input".into()))?;
    let model = non_blank(req.model).unwrap_or_else(|| state.args.parse_model.clone());

    let event = state.responses.parse::<T>(&model, &input).await?;
    Ok(Json(ParsedResponse { success: true, event }))
}

pub async fn parse_event_handler(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>
) -> Result<Json<ParsedResponse<CalendarEvent>>, ApiError> {
    let Json(req) = payload?;
    parse_structured(&state, req).await
}

pub async fn parse_cottage_handler(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>
) -> Result<Json<ParsedResponse<PropertyListing>>, ApiError> {
    let Json(req) = payload?;
    parse_structured(&state, req).await
}

pub async fn web_search_handler(
    State(state): State<AppState>,
    payload: Result<Json<WebSearchRequest>, JsonRejection>
) -> Result<Json<WebSearchResponse>, ApiError> {
    let Json(req) = payload?;
    let query = non_blank(req.query).ok_or_else(||
        ApiError::BadRequest("Missing or empty search query.".into())
    )?;

    let (processed, raw) = state.responses.web_search(
        &state.args.responses_model,
        &query,
        req.location.as_deref(),
        SearchContextSize::from_ui(req.context_size.as_deref())
    ).await?;

    Ok(Json(WebSearchResponse { success: true, processed, raw }))
}

pub async fn file_analyzer_handler(
    State(state): State<AppState>,
    mut multipart: Multipart
) -> Result<Json<AnswerResponse>, ApiError> {
    let mut upload = None;
    let mut question = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                upload = Some(Upload { data: field.bytes().await?, file_name, content_type });
            }
            Some("question") => {
                question = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let (Some(upload), Some(question)) = (upload, non_blank(question)) else {
        return Err(ApiError::BadRequest("Missing file or question".into()));
    };

    let file_name = upload.file_name.unwrap_or_else(|| "upload".to_string());
    let file_id = state.responses.upload_file(
        upload.data,
        &file_name,
        upload.content_type.as_deref()
    ).await?;
    let answer = state.responses.ask_about_file(&state.args.responses_model, &file_id, &question).await?;

    Ok(Json(AnswerResponse { success: true, answer }))
}

pub async fn image_analyzer_handler(
    State(state): State<AppState>,
    payload: Result<Json<ImageQuestionRequest>, JsonRejection>
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(image_url), Some(question)) = (non_blank(req.image_url), non_blank(req.question)) else {
        return Err(ApiError::BadRequest("Missing input".into()));
    };

    let answer = state.chat
        .ask_about_image(&state.args.vision_model, &question, &image_url, IMAGE_QUESTION_MAX_TOKENS).await?
        .unwrap_or_else(|| "No response".to_string());

    Ok(Json(AnswerResponse { success: true, answer }))
}
