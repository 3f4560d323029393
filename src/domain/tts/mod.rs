pub mod batch;
pub mod cancel;
pub mod dto;
pub mod error;
pub mod language;
pub mod progress;
pub mod segmenter;
pub mod service;


pub use batch::{plan_batch, BatchObserver, BatchOutcome, BatchService};
pub use cancel::CancelToken;
pub use error::{SpeechError, TtsServiceError};
pub use language::{build_detector, detect_language, LanguageCode};
pub use segmenter::{SegmentError, SegmentPolicy, Segmenter, TextChunk};
pub use service::{ConversionService, ConversionServiceApi};
