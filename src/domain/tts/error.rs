use super::segmenter::SegmentError;
use crate::domain::audio::AssemblyError;
use crate::domain::job::JobError;
use crate::error::AppError;

/// Failure of a single synthesis request, classified from the transport outcome
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("Invalid API key. Check the key and try again.")]
    InvalidCredential,
    #[error("Rate limit reached. Wait a moment and try again.")]
    RateLimited,
    #[error("The speech service had an internal error. Try again later.")]
    Upstream,
    #[error("Could not reach the speech service: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("an API key is required")]
    MissingCredential,
    #[error("no content")]
    NoContent,
    #[error(transparent)]
    ChunkTooLarge(#[from] SegmentError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error("audio assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("conversion cancelled")]
    Cancelled,
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        match err {
            TtsServiceError::Invalid(msg) => AppError::BadRequest(msg),
            TtsServiceError::NoContent => AppError::BadRequest(err.to_string()),
            TtsServiceError::MissingCredential => AppError::Unauthorized(err.to_string()),
            TtsServiceError::ChunkTooLarge(e) => AppError::PayloadTooLarge(e.to_string()),
            TtsServiceError::Speech(SpeechError::InvalidCredential) => {
                AppError::Unauthorized(SpeechError::InvalidCredential.to_string())
            }
            TtsServiceError::Speech(SpeechError::RateLimited) => {
                AppError::RateLimitExceeded(SpeechError::RateLimited.to_string())
            }
            TtsServiceError::Speech(e) => AppError::ExternalService(e.to_string()),
            TtsServiceError::Assembly(e) => AppError::Internal(e.to_string()),
            TtsServiceError::Cancelled => AppError::Conflict(err.to_string()),
            TtsServiceError::Job(e) => AppError::Internal(e.to_string()),
            TtsServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
