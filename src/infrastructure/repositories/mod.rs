pub mod batch_repository;
pub mod openai_speech_repository;
pub mod speech_repository;

pub use batch_repository::{BatchRecord, BatchRepository, RecordObserver, SharedBatch};
pub use openai_speech_repository::OpenAiSpeechRepository;
pub use speech_repository::SpeechRepository;
