//! Shared helpers: a router wired to a wiremock stand-in for the OpenAI API.

#![allow(dead_code)]

use ai_playground::cli::Args;
use ai_playground::server::{ router, AppState };
use axum::{ body::Body, http::Request, Router };
use clap::Parser;
use serde_json::Value;
use wiremock::MockServer;

pub const BOUNDARY: &str = "----playground-test-boundary";

pub async fn setup_with(extra: &[&str]) -> (MockServer, Router) {
    let mock = MockServer::start().await;
    let uri = mock.uri();
    let mut argv = vec!["ai-playground", "--openai-api-key", "sk-test", "--openai-base-url", uri.as_str()];
    if !extra.contains(&"--rate-limit-per-second") {
        argv.extend_from_slice(&["--rate-limit-per-second", "10000"]);
    }
    argv.extend_from_slice(extra);

    let args = Args::parse_from(argv);
    let state = AppState::from_args(&args).expect("state should build");
    (mock, router(state))
}

pub async fn setup() -> (MockServer, Router) {
    setup_with(&[]).await
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// (field name, optional file name, optional content type, bytes)
pub type FormPart<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

pub fn multipart_request(uri: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, content_type, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", name, file).as_bytes()
                );
            }
            None => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes());
            }
        }
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body should be complete").to_vec()
}

pub async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("body should be JSON")
}

/// Renders chat completion deltas the way the provider streams them.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut out = String::from("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n");
    for fragment in fragments {
        let chunk = serde_json::json!({
            "choices": [{ "delta": { "content": fragment }, "finish_reason": null }]
        });
        out.push_str(&format!("data: {}\n\n", chunk));
    }
    out.push_str("data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n");
    out.push_str("data: [DONE]\n\n");
    out
}

/// A `/responses` payload whose message carries `text` as output.
pub fn responses_body(text: &str) -> Value {
    serde_json::json!({
        "id": "resp_1",
        "object": "response",
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": text, "annotations": [] }]
        }]
    })
}
