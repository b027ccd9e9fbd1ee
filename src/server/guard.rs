use axum::{ extract::{ Request, State }, middleware::Next, response::Response };
use log::{ debug, warn };

use super::AppState;
use crate::error::ApiError;

fn provided_api_key(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if from_header.is_some() {
        return from_header;
    }

    let query = req.uri().query()?;
    for pair in query.split('&') {
        let mut kv = pair.splitn(2, '=');
        if kv.next() == Some("api_key") {
            return kv.next().map(|v| v.to_string());
        }
    }
    None
}

/// Global rate limit first, then the optional shared API key.
pub async fn guard(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    if state.limiter.check().is_err() {
        warn!("Global rate limit exceeded for {}. Rejecting request.", req.uri().path());
        return Err(ApiError::RateLimited);
    }

    if let Some(required) = state.args.server_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        let provided = provided_api_key(&req);
        if provided.as_deref() != Some(required) {
            warn!("{}: bad or missing API key", req.uri().path());
            return Err(ApiError::Unauthorized);
        }
        debug!("{} authenticated", req.uri().path());
    }

    Ok(next.run(req).await)
}
