use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const INVALID_KEY: &str = "invalid-key";
pub const RATE_LIMITED_KEY: &str = "rate-limited-key";
pub const FAIL_UPSTREAM: &str = "FAIL_UPSTREAM";
pub const SLOW: &str = "SLOW";

const SLOW_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedCall {
    #[serde(skip)]
    pub authorization: String,
    pub model: String,
    pub input: String,
    pub voice: String,
    pub response_format: Option<String>,
}

/// Stand-in for the OpenAI `/audio/speech` endpoint
#[derive(Clone, Default)]
pub struct FakeSpeechApi {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeSpeechApi {
    /// Serve on an ephemeral port and return the API base URL
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/v1/audio/speech", post(speech))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake speech API");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/v1", addr)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// The bytes the fake returns for `input`
    pub fn audio_for(input: &str) -> Vec<u8> {
        format!("MP3[{}]", input).into_bytes()
    }
}

async fn speech(
    State(api): State<FakeSpeechApi>,
    headers: HeaderMap,
    Json(mut call): Json<RecordedCall>,
) -> Response {
    call.authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    api.calls.lock().push(call.clone());

    match call.authorization.strip_prefix("Bearer ") {
        Some(INVALID_KEY) => {
            return error(StatusCode::UNAUTHORIZED, "Incorrect API key provided");
        }
        Some(RATE_LIMITED_KEY) => {
            return error(StatusCode::TOO_MANY_REQUESTS, "Rate limit reached");
        }
        Some(_) => {}
        None => return error(StatusCode::UNAUTHORIZED, "Missing bearer token"),
    }

    if call.input.contains(FAIL_UPSTREAM) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "The server had an error");
    }
    if call.input.contains(SLOW) {
        tokio::time::sleep(SLOW_DELAY).await;
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        FakeSpeechApi::audio_for(&call.input),
    )
        .into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": { "message": message } }))).into_response()
}
