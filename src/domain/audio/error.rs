#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("no audio fragments to assemble")]
    EmptyFragmentList,
    #[error("fragment {chunk_index} is {found} Hz but the first fragment is {expected} Hz")]
    IncompatibleFormat {
        chunk_index: usize,
        expected: u32,
        found: u32,
    },
    #[error("could not decode audio: {0}")]
    Decode(String),
    #[error("could not encode audio: {0}")]
    Encode(String),
}
