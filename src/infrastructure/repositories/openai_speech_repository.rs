use super::speech_repository::SpeechRepository;
use crate::domain::audio::AudioFragment;
use crate::domain::tts::progress::ByteProgressPolicy;
use crate::domain::tts::{SpeechError, TextChunk};
use async_openai::types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use reqwest::StatusCode;

const PREVIEW_CHARS: usize = 200;

/// OpenAI-compatible `/audio/speech` client
pub struct OpenAiSpeechRepository {
    http: reqwest::Client,
    base_url: String,
    model: String,
    progress_policy: ByteProgressPolicy,
}

impl OpenAiSpeechRepository {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        model: String,
        progress_policy: ByteProgressPolicy,
    ) -> Self {
        Self {
            http,
            base_url,
            model,
            progress_policy,
        }
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, text: &str, voice: &str) -> CreateSpeechRequest {
        // Parse model string to SpeechModel enum
        let model = match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };

        CreateSpeechRequest {
            model,
            input: text.to_string(),
            voice: parse_voice(voice),
            response_format: Some(SpeechResponseFormat::Mp3),
            speed: None,
        }
    }
}

fn parse_voice(voice: &str) -> Voice {
    match voice.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        other => {
            tracing::warn!(voice = other, "Unknown voice, falling back to alloy");
            Voice::Alloy
        }
    }
}

/// Map a non-success HTTP status onto the speech error taxonomy
pub fn classify_status(status: StatusCode) -> SpeechError {
    match status {
        StatusCode::UNAUTHORIZED => SpeechError::InvalidCredential,
        StatusCode::TOO_MANY_REQUESTS => SpeechError::RateLimited,
        StatusCode::INTERNAL_SERVER_ERROR => SpeechError::Upstream,
        other => SpeechError::Transport(format!("unexpected status {}", other)),
    }
}

fn classify_transport(err: &reqwest::Error) -> SpeechError {
    if err.is_timeout() {
        SpeechError::Transport("request timed out".to_string())
    } else if err.is_connect() {
        SpeechError::Transport("connection failed".to_string())
    } else {
        SpeechError::Transport(err.to_string())
    }
}

#[async_trait]
impl SpeechRepository for OpenAiSpeechRepository {
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        credential: &str,
        voice: &str,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<AudioFragment, SpeechError> {
        let start_time = std::time::Instant::now();
        let text_chars = chunk.content.chars().count();
        let preview: String = chunk.content.chars().take(PREVIEW_CHARS).collect();

        tracing::info!(
            model = %self.model,
            voice = voice,
            chunk_index = chunk.index,
            text_length = text_chars,
            text_preview = %preview,
            "Calling speech API"
        );

        let mut response = self
            .http
            .post(self.speech_url())
            .bearer_auth(credential)
            .json(&self.build_request(&chunk.content, voice))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    chunk_index = chunk.index,
                    "Speech API request failed"
                );
                classify_transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_preview: String = body.chars().take(PREVIEW_CHARS).collect();
            tracing::error!(
                status = status.as_u16(),
                chunk_index = chunk.index,
                body = %body_preview,
                "Speech API returned an error status"
            );
            return Err(classify_status(status));
        }

        let content_length = response.content_length();
        let mut bytes = Vec::with_capacity(content_length.unwrap_or(0) as usize);
        while let Some(piece) = response.chunk().await.map_err(|e| {
            tracing::error!(
                error = %e,
                chunk_index = chunk.index,
                received = bytes.len(),
                "Speech API body read failed"
            );
            classify_transport(&e)
        })? {
            bytes.extend_from_slice(&piece);
            on_progress(
                self.progress_policy
                    .percent(bytes.len() as u64, content_length, text_chars),
            );
        }

        tracing::info!(
            chunk_index = chunk.index,
            latency_ms = start_time.elapsed().as_millis(),
            audio_size = bytes.len(),
            declared_length = ?content_length,
            "Speech chunk received"
        );

        Ok(AudioFragment {
            chunk_index: chunk.index,
            bytes,
        })
    }
}
