use super::cancel::CancelToken;
use super::error::TtsServiceError;
use super::language::{build_detector, detect_language, supported_voice};
use super::progress::{job_percent, ChunkProgress, MonotonicProgress};
use super::segmenter::{Segmenter, TextChunk};
use crate::domain::audio::{ArtifactHandle, ArtifactStore, AudioAssembler, AudioFragment};
use crate::domain::job::{Job, JobError, JobStatus};
use crate::infrastructure::repositories::SpeechRepository;
use async_trait::async_trait;
use lingua::LanguageDetector;
use std::sync::Arc;

/// Runs the chunk → request → assemble pipeline for one job at a time
pub struct ConversionService {
    speech_repo: Arc<dyn SpeechRepository>,
    artifacts: ArtifactStore,
    segmenter: Segmenter,
    assembler: AudioAssembler,
    default_voice: Option<String>,
    language_detector: LanguageDetector,
}

impl ConversionService {
    pub fn new(
        speech_repo: Arc<dyn SpeechRepository>,
        artifacts: ArtifactStore,
        segmenter: Segmenter,
        assembler: AudioAssembler,
        default_voice: Option<String>,
    ) -> Self {
        Self {
            speech_repo,
            artifacts,
            segmenter,
            assembler,
            default_voice,
            language_detector: build_detector(),
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Voice for `text`: the requested one, else the configured default,
    /// else the voice of the detected language
    pub fn resolve_voice(&self, text: &str, requested: Option<&str>) -> String {
        if let Some(voice) = requested.map(str::trim).filter(|v| !v.is_empty()) {
            return supported_voice(voice).to_string();
        }
        if let Some(voice) = &self.default_voice {
            return supported_voice(voice).to_string();
        }

        let language = detect_language(&self.language_detector, text);
        tracing::debug!(language = %language, voice = language.voice(), "Voice selected from detected language");
        language.voice().to_string()
    }

    /// Split `text` into its chunks, failing on the first unsplittable sentence
    pub fn segment(&self, text: &str) -> Result<Vec<TextChunk>, TtsServiceError> {
        Ok(self.segmenter.segment(text).collect::<Result<Vec<_>, _>>()?)
    }

    /// Drive a job that is already `processing` to `success` or `error`.
    ///
    /// Pipeline failures end up in the job; only an illegal transition is
    /// returned to the caller.
    pub(crate) async fn execute(
        &self,
        job: &mut Job,
        credential: &str,
        voice: &str,
        cancel: &CancelToken,
        on_chunk: &mut (dyn FnMut(ChunkProgress) + Send),
    ) -> Result<(), JobError> {
        let start_time = std::time::Instant::now();
        let outcome = self.run_pipeline(job, credential, voice, cancel, on_chunk).await;

        match &outcome {
            Ok(handle) => tracing::info!(
                job_id = %job.id(),
                artifact_id = %handle.id(),
                chunk_count = job.chunk_count().unwrap_or(0),
                latency_ms = start_time.elapsed().as_millis(),
                "Job succeeded"
            ),
            Err(err) => tracing::warn!(
                job_id = %job.id(),
                error = %err,
                latency_ms = start_time.elapsed().as_millis(),
                "Job failed"
            ),
        }

        job.finish(outcome)
    }

    async fn run_pipeline(
        &self,
        job: &mut Job,
        credential: &str,
        voice: &str,
        cancel: &CancelToken,
        on_chunk: &mut (dyn FnMut(ChunkProgress) + Send),
    ) -> Result<ArtifactHandle, TtsServiceError> {
        let chunks = self.segment(job.text())?;
        job.record_chunk_count(chunks.len());
        if chunks.is_empty() {
            return Err(TtsServiceError::NoContent);
        }

        tracing::info!(
            job_id = %job.id(),
            chunk_count = chunks.len(),
            voice = voice,
            "Text segmented"
        );

        let fragments = self
            .synthesize_chunks(&chunks, credential, voice, cancel, on_chunk)
            .await?;
        self.assemble(job.output_filename(), fragments).await
    }

    /// Request every chunk in index order, one at a time
    async fn synthesize_chunks(
        &self,
        chunks: &[TextChunk],
        credential: &str,
        voice: &str,
        cancel: &CancelToken,
        on_chunk: &mut (dyn FnMut(ChunkProgress) + Send),
    ) -> Result<Vec<AudioFragment>, TtsServiceError> {
        let total = chunks.len();
        let mut fragments = Vec::with_capacity(total);

        for chunk in chunks {
            if cancel.is_cancelled() {
                return Err(TtsServiceError::Cancelled);
            }

            let index = chunk.index;
            on_chunk(ChunkProgress {
                index,
                total,
                percent: 0,
            });

            let fragment = self
                .speech_repo
                .synthesize(chunk, credential, voice, &mut |percent| {
                    on_chunk(ChunkProgress {
                        index,
                        total,
                        percent,
                    })
                })
                .await?;

            // A result that arrives after cancellation is dropped
            if cancel.is_cancelled() {
                return Err(TtsServiceError::Cancelled);
            }

            on_chunk(ChunkProgress {
                index,
                total,
                percent: 100,
            });
            fragments.push(fragment);
        }

        Ok(fragments)
    }

    async fn assemble(
        &self,
        filename: &str,
        fragments: Vec<AudioFragment>,
    ) -> Result<ArtifactHandle, TtsServiceError> {
        let assembler = self.assembler;
        let audio = tokio::task::spawn_blocking(move || assembler.assemble(fragments))
            .await
            .map_err(anyhow::Error::from)??;

        tracing::debug!(
            filename = filename,
            fragment_count = audio.fragment_count,
            audio_size = audio.bytes.len(),
            merge_policy = ?assembler.policy(),
            "Audio assembled"
        );

        Ok(self.artifacts.register(filename, audio))
    }
}

/// Checks that must pass before a job is touched
fn validate<'a>(
    text: &str,
    credential: Option<&'a str>,
) -> Result<&'a str, TtsServiceError> {
    if text.trim().is_empty() {
        return Err(TtsServiceError::Invalid("text cannot be empty".to_string()));
    }
    credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(TtsServiceError::MissingCredential)
}

#[async_trait]
pub trait ConversionServiceApi: Send + Sync {
    /// Convert the text of a single job into one audio artifact
    ///
    /// This operation:
    /// - Validates text and credential without touching the job
    /// - Starts a fresh cycle (a finished job goes back to pending first)
    /// - Segments, requests every chunk in order and assembles the audio
    /// - Reports job progress, always ending at 100
    ///
    /// Returns the terminal status; the artifact or error lives in the job
    async fn convert(
        &self,
        job: &mut Job,
        credential: Option<&str>,
        voice: &str,
        cancel: &CancelToken,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<JobStatus, TtsServiceError>;
}

#[async_trait]
impl ConversionServiceApi for ConversionService {
    async fn convert(
        &self,
        job: &mut Job,
        credential: Option<&str>,
        voice: &str,
        cancel: &CancelToken,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<JobStatus, TtsServiceError> {
        let credential = validate(job.text(), credential)?;

        tracing::info!(
            job_id = %job.id(),
            source = ?job.source(),
            text_length = job.text().chars().count(),
            voice = voice,
            "Conversion requested"
        );

        job.reset();
        job.start()?;

        let mut progress = MonotonicProgress::default();
        {
            let mut on_chunk = |chunk: ChunkProgress| {
                if let Some(percent) = progress.advance(job_percent(chunk)) {
                    on_progress(percent);
                }
            };
            self.execute(job, credential, voice, cancel, &mut on_chunk)
                .await?;
        }
        if let Some(percent) = progress.advance(100) {
            on_progress(percent);
        }

        Ok(job.status())
    }
}
