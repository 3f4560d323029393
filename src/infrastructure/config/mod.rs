use crate::domain::audio::MergePolicy;
use crate::domain::tts::SegmentPolicy;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Speech API
    pub openai_base_url: String,
    /// Used when a request carries no credential of its own
    pub openai_api_key: Option<String>,
    pub tts_model: String,
    pub tts_default_voice: Option<String>,
    pub tts_request_timeout_secs: u64,
    // Pipeline
    pub max_chunk_size: usize,
    pub segment_policy: SegmentPolicy,
    pub merge_policy: MergePolicy,
    pub bytes_per_char: u64,
    pub upload_max_bytes: usize,
    // Batches
    pub batch_ttl_minutes: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_format: LogFormat::Pretty,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            tts_model: "tts-1".to_string(),
            tts_default_voice: None,
            tts_request_timeout_secs: 120,
            max_chunk_size: 4000,
            segment_policy: SegmentPolicy::Strict,
            merge_policy: MergePolicy::Concatenate,
            bytes_per_char: 50,
            upload_max_bytes: 5 * 1024 * 1024,
            batch_ttl_minutes: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let config = Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            tts_model: env::var("TTS_MODEL").unwrap_or(defaults.tts_model),
            tts_default_voice: optional_var("TTS_DEFAULT_VOICE"),
            tts_request_timeout_secs: parse_var(
                "TTS_REQUEST_TIMEOUT_SECS",
                defaults.tts_request_timeout_secs,
            )?,
            max_chunk_size: parse_var("TTS_MAX_CHUNK_SIZE", defaults.max_chunk_size)?,
            segment_policy: match optional_var("TTS_SEGMENT_POLICY").as_deref() {
                None | Some("strict") => SegmentPolicy::Strict,
                Some("lenient") => SegmentPolicy::Lenient,
                Some(other) => return Err(format!("invalid TTS_SEGMENT_POLICY: {}", other).into()),
            },
            merge_policy: match optional_var("TTS_MERGE_POLICY").as_deref() {
                None | Some("concatenate") => MergePolicy::Concatenate,
                Some("reencode") => MergePolicy::Reencode,
                Some(other) => return Err(format!("invalid TTS_MERGE_POLICY: {}", other).into()),
            },
            bytes_per_char: parse_var("TTS_BYTES_PER_CHAR", defaults.bytes_per_char)?,
            upload_max_bytes: parse_var("UPLOAD_MAX_BYTES", defaults.upload_max_bytes)?,
            batch_ttl_minutes: parse_var("BATCH_TTL_MINUTES", defaults.batch_ttl_minutes)?,
        };

        if config.max_chunk_size == 0 {
            return Err("TTS_MAX_CHUNK_SIZE must be greater than zero".into());
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.tts_request_timeout_secs)
    }

    pub fn batch_ttl(&self) -> Duration {
        Duration::from_secs(self.batch_ttl_minutes * 60)
    }
}

/// Set and non-blank
fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| format!("invalid {}: {}", key, e).into()),
        None => Ok(default),
    }
}
