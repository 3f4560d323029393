use std::sync::Arc;
use test_context::AsyncTestContext;
use textcast_backend::domain::tts::progress::ByteProgressPolicy;
use textcast_backend::infrastructure::config::Config;
use textcast_backend::infrastructure::http::build_app;
use textcast_backend::infrastructure::repositories::OpenAiSpeechRepository;
use tokio::net::TcpListener;

pub mod api_client;
pub mod fake_speech_api;

use api_client::{ApiResponse, TestClient};
use fake_speech_api::FakeSpeechApi;

pub const TEST_KEY: &str = "sk-test";

/// Small enough that a few sentences span several chunks
pub const TEST_MAX_CHUNK_SIZE: usize = 200;

pub struct TestContext {
    pub client: TestClient,
    pub speech_api: FakeSpeechApi,
    #[allow(dead_code)]
    pub config: Config,
}

impl TestContext {
    /// Start the fake speech API and an app configured by `configure`
    pub async fn start(configure: impl FnOnce(&mut Config)) -> Self {
        let speech_api = FakeSpeechApi::default();
        let speech_base_url = speech_api.start().await;

        let mut config = Config {
            host: "127.0.0.1".to_string(),
            port: 0, // Will be assigned by the OS
            openai_base_url: speech_base_url,
            tts_default_voice: Some("alloy".to_string()),
            max_chunk_size: TEST_MAX_CHUNK_SIZE,
            ..Config::default()
        };
        configure(&mut config);

        let speech_repo = Arc::new(OpenAiSpeechRepository::new(
            reqwest::Client::new(),
            config.openai_base_url.clone(),
            config.tts_model.clone(),
            ByteProgressPolicy::new(config.bytes_per_char),
        ));
        let app = build_app(Arc::new(config.clone()), speech_repo);

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: TestClient::new(&base_url),
            speech_api,
            config,
        }
    }

    /// Poll a batch until it leaves the running state
    pub async fn wait_for_batch(&self, batch_id: &str) -> ApiResponse {
        let path = format!("/api/batches/{}", batch_id);
        for _ in 0..100 {
            let response = self.client.get(&path).await.unwrap();
            let status = response
                .body
                .as_ref()
                .and_then(|b| b.get("status"))
                .and_then(|s| s.as_str())
                .map(str::to_string);
            if status.as_deref() != Some("running") {
                return response;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }
        panic!("batch {} did not finish in time", batch_id);
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async { TestContext::start(|_| {}).await }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Servers stop with the test runtime
        }
    }
}

/// Natural-looking prose of roughly `len` characters, a period every ~45 chars
pub fn prose(len: usize) -> String {
    let mut text = String::new();
    let mut n = 0;
    while text.len() < len {
        text.push_str(&format!("Sentence number {} talks about the weather. ", n));
        n += 1;
    }
    text.truncate(len);
    text
}
