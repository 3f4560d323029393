use crate::domain::audio::AudioFragment;
use crate::domain::tts::{SpeechError, TextChunk};
use async_trait::async_trait;

/// Repository for single-chunk speech synthesis.
/// Abstracts the underlying provider (OpenAI or any compatible API).
///
/// Implementations send exactly one request per call. They do not retry,
/// batch, split text, or touch job state; chunking, ordering and merging
/// belong to the conversion pipeline.
#[async_trait]
pub trait SpeechRepository: Send + Sync {
    /// Synthesize one chunk of text into encoded MP3 bytes
    ///
    /// # Arguments
    /// * `chunk` - The chunk to speak; its index tags the returned fragment
    /// * `credential` - Caller-supplied API key, passed through as a bearer token
    /// * `voice` - Provider voice id
    /// * `on_progress` - Called with the percentage of the response received so far
    ///
    /// # Errors
    /// Returns a classified [`SpeechError`]; no fragment is produced on failure
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        credential: &str,
        voice: &str,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<AudioFragment, SpeechError>;
}
