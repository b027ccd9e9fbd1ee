mod common;

use axum::http::{ header, StatusCode };
use common::*;
use serde_json::json;
use tower::ServiceExt;
use wiremock::{ matchers::{ body_partial_json, method, path }, Mock, ResponseTemplate };

#[tokio::test]
async fn completion_tester_switches_between_chat_and_legacy() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "gpt-4" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "chat-1", "choices": [] })))
        .expect(1)
        .mount(&mock).await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .and(body_partial_json(json!({ "model": "gpt-3.5-turbo-instruct", "prompt": "Say hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cmpl-1", "choices": [] })))
        .expect(1)
        .mount(&mock).await;

    let chat = json!({ "input": [{ "role": "user", "content": "Say hi" }], "useRoles": true });
    let resp = app.clone().oneshot(json_request("/api/openai", chat)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["id"], "chat-1");

    let legacy = json!({ "model": "gpt-3.5-turbo-instruct", "input": "Say hi", "useRoles": false });
    let resp = app.oneshot(json_request("/api/openai", legacy)).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "cmpl-1");
}

#[tokio::test]
async fn transcription_returns_the_text() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "testing one two" })))
        .expect(1)
        .mount(&mock).await;

    let req = multipart_request(
        "/api/openai/audio-transcribe",
        &[("audio", Some("clip.webm"), Some("audio/webm"), b"webm-bytes")]
    );
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "success": true, "transcription": "testing one two" }));
}

#[tokio::test]
async fn transcription_without_audio_is_rejected() {
    let (mock, app) = setup().await;
    Mock::given(path("/audio/transcriptions")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock).await;

    let req = multipart_request("/api/openai/audio-transcribe", &[("note", None, None, b"nothing")]);
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No audio file provided");
}

#[tokio::test]
async fn speech_returns_raw_audio_with_headers() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_partial_json(json!({ "model": "tts-1", "input": "Read me", "voice": "nova", "response_format": "wav" })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"RIFF".to_vec(), "audio/wav"))
        .expect(1)
        .mount(&mock).await;

    let resp = app
        .oneshot(json_request("/api/openai/audio-tts", json!({ "text": "Read me", "voice": "nova", "format": "wav" }))).await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(resp.headers()[header::CONTENT_DISPOSITION], "inline; filename=\"speech.wav\"");
    assert_eq!(body_bytes(resp).await, b"RIFF");
}

#[tokio::test]
async fn speech_without_text_is_rejected() {
    let (_mock, app) = setup().await;
    let resp = app.oneshot(json_request("/api/openai/audio-tts", json!({ "voice": "alloy" }))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No text provided");
}

#[tokio::test]
async fn image_generation_returns_a_data_url() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({ "model": "dall-e-2", "size": "1024x1024", "response_format": "b64_json", "n": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "b64_json": "aW1n" }] })))
        .expect(1)
        .mount(&mock).await;

    let resp = app
        .oneshot(
            json_request(
                "/api/openai/image-generation",
                json!({ "prompt": "a lighthouse", "size": "4096x4096", "outputFormat": "png" })
            )
        ).await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["imageUrl"], "data:image/png;base64,aW1n");
}

#[tokio::test]
async fn product_image_asks_for_a_small_url() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({ "size": "512x512", "response_format": "url" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "url": "https://img.example/1.png" }] }))
        )
        .expect(1)
        .mount(&mock).await;

    let resp = app
        .oneshot(
            json_request(
                "/api/openai/product-image-generator",
                json!({
                    "name": "Trail Mug",
                    "category": "Kitchen",
                    "features": ["insulated"],
                    "personality": "rugged",
                    "platform": "instagram"
                })
            )
        ).await
        .unwrap();

    assert_eq!(body_json(resp).await, json!({ "success": true, "url": "https://img.example/1.png" }));
}

#[tokio::test]
async fn product_copy_makes_one_completion_per_format() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "gpt-4", "max_tokens": 600 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({ "choices": [{ "message": { "role": "assistant", "content": "Great mug." } }] })
            )
        )
        .expect(2)
        .mount(&mock).await;

    let resp = app
        .oneshot(
            json_request(
                "/api/openai/product-description-generator",
                json!({
                    "name": "Trail Mug",
                    "category": "Kitchen",
                    "features": ["insulated", "lightweight"],
                    "audience": "hikers",
                    "price": "$25",
                    "personality": "rugged",
                    "formats": ["website", "email"]
                })
            )
        ).await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["content"]["website"], "Great mug.");
    assert_eq!(body["content"]["email"], "Great mug.");
}

#[tokio::test]
async fn parse_event_returns_the_structured_object() {
    let (mock, app) = setup().await;
    let event = json!({ "name": "Science fair", "date": "Friday", "participants": ["Alice", "Bob"] });
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(json!({ "text": { "format": { "type": "json_schema", "name": "event", "strict": true } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(responses_body(&event.to_string())))
        .expect(1)
        .mount(&mock).await;

    let resp = app
        .oneshot(
            json_request("/api/openai/parse-event", json!({ "input": "Alice and Bob go to a science fair on Friday." }))
        ).await
        .unwrap();

    assert_eq!(body_json(resp).await, json!({ "success": true, "event": event }));
}

#[tokio::test]
async fn parse_cottage_requires_input() {
    let (mock, app) = setup().await;
    Mock::given(path("/responses")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock).await;

    let resp = app.oneshot(json_request("/api/openai/parse-cottage", json!({ "input": "  " }))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Missing input");
}

#[tokio::test]
async fn web_search_passes_location_and_context() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(
            body_partial_json(
                json!({
                    "model": "gpt-4.1",
                    "input": "weather today",
                    "tools": [{
                        "type": "web_search_preview",
                        "search_context_size": "high",
                        "user_location": { "type": "approximate", "city": "Oslo" }
                    }]
                })
            )
        )
        .respond_with(ResponseTemplate::new(200).set_body_json(responses_body("Cold and clear.")))
        .expect(1)
        .mount(&mock).await;

    let resp = app
        .oneshot(
            json_request(
                "/api/openai/web-search",
                json!({ "query": "weather today", "location": "Oslo", "contextSize": "large" })
            )
        ).await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["processed"], "Cold and clear.");
    assert_eq!(body["raw"]["id"], "resp_1");
}

#[tokio::test]
async fn web_search_rejects_blank_query() {
    let (_mock, app) = setup().await;
    let resp = app.oneshot(json_request("/api/openai/web-search", json!({ "query": "" }))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Missing or empty search query.");
}

#[tokio::test]
async fn file_analyzer_uploads_then_asks() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-abc", "object": "file" })))
        .expect(1)
        .mount(&mock).await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(
            body_partial_json(
                json!({
                    "input": [{
                        "role": "user",
                        "content": [
                            { "type": "input_file", "file_id": "file-abc" },
                            { "type": "input_text", "text": "What is the total?" }
                        ]
                    }]
                })
            )
        )
        .respond_with(ResponseTemplate::new(200).set_body_json(responses_body("The total is 42.")))
        .expect(1)
        .mount(&mock).await;

    let req = multipart_request(
        "/api/openai/file-analyzer",
        &[
            ("file", Some("invoice.pdf"), Some("application/pdf"), b"%PDF-1.4"),
            ("question", None, None, b"What is the total?"),
        ]
    );
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "success": true, "answer": "The total is 42." }));
}

#[tokio::test]
async fn file_analyzer_needs_both_parts() {
    let (mock, app) = setup().await;
    Mock::given(path("/files")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock).await;

    let req = multipart_request(
        "/api/openai/file-analyzer",
        &[("file", Some("invoice.pdf"), Some("application/pdf"), b"%PDF-1.4")]
    );
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Missing file or question");
}

#[tokio::test]
async fn image_analyzer_answers_or_falls_back() {
    let (mock, app) = setup().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "gpt-4o" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] })
            )
        )
        .expect(1)
        .mount(&mock).await;

    let resp = app
        .oneshot(
            json_request(
                "/api/openai/image-analyzer",
                json!({ "imageUrl": "https://img.example/cat.png", "question": "What animal?" })
            )
        ).await
        .unwrap();

    assert_eq!(body_json(resp).await, json!({ "success": true, "answer": "No response" }));
}

#[tokio::test]
async fn api_key_is_enforced_when_configured() {
    let (_mock, app) = setup_with(&["--server-api-key", "letmein"]).await;

    let resp = app.clone().oneshot(json_request("/api/openai/web-search", json!({ "query": "" }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["success"], false);

    let mut req = json_request("/api/openai/web-search", json!({ "query": "" }));
    req.headers_mut().insert("X-API-Key", "letmein".parse().unwrap());
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = json_request("/api/openai/web-search?api_key=letmein", json!({ "query": "" }));
    assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn requests_over_the_rate_limit_are_rejected() {
    let (_mock, app) = setup_with(&["--rate-limit-per-second", "1"]).await;

    let first = app.clone().oneshot(json_request("/api/openai/web-search", json!({ "query": "" }))).await.unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = app.oneshot(json_request("/api/openai/web-search", json!({ "query": "" }))).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
