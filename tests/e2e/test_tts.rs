use crate::e2e::helpers;

use helpers::fake_speech_api::{
    FakeSpeechApi, FAIL_UPSTREAM, INVALID_KEY, RATE_LIMITED_KEY,
};
use helpers::{prose, TestContext, TEST_KEY, TEST_MAX_CHUNK_SIZE};
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_text_to_speech(ctx: &TestContext) {
    let text = "Hello, this is a test message for text to speech.";

    let response = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &json!({ "text": text }), TEST_KEY)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg")
        .assert_header("content-disposition", "attachment; filename=\"speech.mp3\"")
        .assert_header("x-chunk-count", "1")
        .assert_header("x-voice-used", "alloy")
        .assert_header_exists("x-job-id");
    assert_eq!(response.body_bytes, FakeSpeechApi::audio_for(text));

    let calls = ctx.speech_api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization, format!("Bearer {}", TEST_KEY));
    assert_eq!(calls[0].model, "tts-1");
    assert_eq!(calls[0].voice, "alloy");
    assert_eq!(calls[0].input, text);
    assert_eq!(calls[0].response_format.as_deref(), Some("mp3"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_split_long_text_and_merge_in_order(ctx: &TestContext) {
    let text = prose(TEST_MAX_CHUNK_SIZE * 3);

    let response = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &json!({ "text": text }), TEST_KEY)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);

    let calls = ctx.speech_api.calls();
    assert!(calls.len() > 1, "expected several chunks, got {}", calls.len());
    assert_eq!(
        response.header("x-chunk-count"),
        Some(&calls.len().to_string())
    );
    assert!(calls
        .iter()
        .all(|call| call.input.chars().count() <= TEST_MAX_CHUNK_SIZE));

    // Chunks rejoin into the original text, and the audio follows chunk order
    let rejoined = calls
        .iter()
        .map(|call| call.input.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(rejoined, text.trim());

    let expected: Vec<u8> = calls
        .iter()
        .flat_map(|call| FakeSpeechApi::audio_for(&call.input))
        .collect();
    assert_eq!(response.body_bytes, expected);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_use_requested_voice_and_name(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": "Read this aloud.", "voice": "nova", "name": "notes" }),
            TEST_KEY,
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("x-voice-used", "nova")
        .assert_header("content-disposition", "attachment; filename=\"notes.mp3\"");
    assert_eq!(ctx.speech_api.calls()[0].voice, "nova");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_the_fallback_voice_for_an_unknown_one(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": "Read this aloud.", "voice": "robot" }),
            TEST_KEY,
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("x-voice-used", "alloy");
    assert_eq!(ctx.speech_api.calls()[0].voice, "alloy");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_a_credential(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/tts/synthesize", &json!({ "text": "Hello." }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("API key is required");
    assert_eq!(ctx.speech_api.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_authorization(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_headers(
            "/api/tts/synthesize",
            &json!({ "text": "Hello." }),
            &[("Authorization", "Basic dXNlcjpwYXNz")],
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid authorization format");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &json!({ "text": "  \n " }), TEST_KEY)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("text cannot be empty");
    assert_eq!(ctx.speech_api.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_sentences_longer_than_the_chunk_limit(ctx: &TestContext) {
    let run_on = "word ".repeat(TEST_MAX_CHUNK_SIZE);

    let response = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &json!({ "text": run_on }), TEST_KEY)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE)
        .assert_error_message(&TEST_MAX_CHUNK_SIZE.to_string());
    assert_eq!(ctx.speech_api.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_classify_speech_api_failures(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &json!({ "text": "Hello." }), INVALID_KEY)
        .await
        .unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid API key");

    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": "Hello." }),
            RATE_LIMITED_KEY,
        )
        .await
        .unwrap();
    response
        .assert_status(StatusCode::TOO_MANY_REQUESTS)
        .assert_error_message("Rate limit reached");

    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": format!("Please {}.", FAIL_UPSTREAM) }),
            TEST_KEY,
        )
        .await
        .unwrap();
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_message("internal error");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_stop_at_the_first_failed_chunk(ctx: &TestContext) {
    let text = format!(
        "{} {}. {}",
        prose(TEST_MAX_CHUNK_SIZE - 20),
        FAIL_UPSTREAM,
        prose(TEST_MAX_CHUNK_SIZE * 2)
    );

    let response = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &json!({ "text": text }), TEST_KEY)
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_GATEWAY);
    let calls = ctx.speech_api.calls();
    assert!(calls.last().unwrap().input.contains(FAIL_UPSTREAM));
    assert!(calls.len() <= 2);
}

#[tokio::test]
async fn it_should_fall_back_to_the_server_key() {
    let ctx = TestContext::start(|config| {
        config.openai_api_key = Some("server-key".to_string());
    })
    .await;

    ctx.client
        .post("/api/tts/synthesize", &json!({ "text": "Hello." }))
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    ctx.client
        .post_with_auth("/api/tts/synthesize", &json!({ "text": "Hello." }), TEST_KEY)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let calls = ctx.speech_api.calls();
    assert_eq!(calls[0].authorization, "Bearer server-key");
    // A caller's own key wins over the configured one
    assert_eq!(calls[1].authorization, format!("Bearer {}", TEST_KEY));
}
