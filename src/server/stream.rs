use axum::{
    body::Body,
    extract::{ rejection::JsonRejection, State },
    http::header,
    response::Response,
    Json,
};

use super::AppState;
use crate::error::ApiError;
use crate::models::api::{ RealtimeChatRequest, SimpleChatRequest };
use crate::relay::frame::Framing;
use crate::relay::history::HistoryWindow;
use crate::relay::{ RelayRequest, RelayStream };

fn stream_response(framing: Framing, stream: RelayStream) -> Result<Response, ApiError> {
    Response::builder()
        .header(header::CONTENT_TYPE, framing.content_type())
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(format!("Failed to build stream response: {}", e)))
}

pub async fn realtime_chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<RealtimeChatRequest>, JsonRejection>
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let model = req.model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.args.chat_model.clone());

    let stream = state.relay.open(RelayRequest {
        model,
        messages: req.messages,
        is_audio: req.is_audio,
        audio_data: req.audio_data,
        window: Some(HistoryWindow::default()),
        framing: req.framing,
    }).await?;

    stream_response(req.framing, stream)
}

pub async fn simple_chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimpleChatRequest>, JsonRejection>
) -> Result<Response, ApiError> {
    let Json(req) = payload?;

    let stream = state.relay.open(RelayRequest {
        model: state.args.simple_chat_model.clone(),
        messages: req.messages,
        is_audio: false,
        audio_data: None,
        window: None,
        framing: Framing::Sentinel,
    }).await?;

    stream_response(Framing::Sentinel, stream)
}
