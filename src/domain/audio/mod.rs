pub mod artifact;
pub mod assembler;
pub mod codec;
pub mod error;

pub use artifact::{Artifact, ArtifactHandle, ArtifactStore};
pub use assembler::{AssembledAudio, AudioAssembler, AudioFragment, MergePolicy, MP3_CONTENT_TYPE};
pub use error::AssemblyError;
