use super::codec::{self, PcmAudio};
use super::error::AssemblyError;
use serde::Deserialize;

pub const MP3_CONTENT_TYPE: &str = "audio/mpeg";

/// Raw encoded audio returned for one text chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFragment {
    pub chunk_index: usize,
    pub bytes: Vec<u8>,
}

/// How multiple fragments are joined into one stream.
///
/// The policy is chosen once per assembler and applies to every
/// multi-fragment job. A single fragment is always passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Append the MP3 frames of each fragment back to back
    #[default]
    Concatenate,
    /// Decode every fragment, join the samples and encode a single stream
    Reencode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledAudio {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub fragment_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AudioAssembler {
    policy: MergePolicy,
}

impl AudioAssembler {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Merge fragments, in chunk order, into one playable MP3 stream
    pub fn assemble(&self, mut fragments: Vec<AudioFragment>) -> Result<AssembledAudio, AssemblyError> {
        if fragments.is_empty() {
            return Err(AssemblyError::EmptyFragmentList);
        }
        fragments.sort_by_key(|fragment| fragment.chunk_index);
        let fragment_count = fragments.len();

        let bytes = if fragment_count == 1 {
            fragments.remove(0).bytes
        } else {
            match self.policy {
                MergePolicy::Concatenate => concatenate(fragments),
                MergePolicy::Reencode => reencode(&fragments)?,
            }
        };

        tracing::debug!(
            policy = ?self.policy,
            fragment_count = fragment_count,
            audio_size = bytes.len(),
            "Audio fragments assembled"
        );

        Ok(AssembledAudio {
            bytes,
            content_type: MP3_CONTENT_TYPE,
            fragment_count,
        })
    }
}

fn concatenate(fragments: Vec<AudioFragment>) -> Vec<u8> {
    let total = fragments.iter().map(|f| f.bytes.len()).sum();
    let mut merged = Vec::with_capacity(total);
    for fragment in fragments {
        merged.extend(fragment.bytes);
    }
    merged
}

fn reencode(fragments: &[AudioFragment]) -> Result<Vec<u8>, AssemblyError> {
    let mut merged: Option<PcmAudio> = None;

    for fragment in fragments {
        let decoded = codec::decode_mp3(&fragment.bytes)?;
        match merged.as_mut() {
            None => merged = Some(decoded),
            Some(merged) => {
                if decoded.sample_rate != merged.sample_rate {
                    return Err(AssemblyError::IncompatibleFormat {
                        chunk_index: fragment.chunk_index,
                        expected: merged.sample_rate,
                        found: decoded.sample_rate,
                    });
                }
                merged.append(&decoded);
            }
        }
    }

    let merged = merged.ok_or(AssemblyError::EmptyFragmentList)?;
    codec::encode_mp3(&merged)
}
