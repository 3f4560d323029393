use super::assembler::AssembledAudio;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Playable audio produced by one job
#[derive(Debug)]
pub struct Artifact {
    pub id: Uuid,
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// In-memory home of every live artifact.
///
/// Artifacts only enter through [`ArtifactStore::register`], which hands back
/// the single [`ArtifactHandle`] that owns the entry. The bytes stay
/// downloadable until that handle is released or dropped.
#[derive(Clone, Default)]
pub struct ArtifactStore {
    artifacts: Arc<RwLock<HashMap<Uuid, Arc<Artifact>>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, filename: impl Into<String>, audio: AssembledAudio) -> ArtifactHandle {
        let artifact = Artifact {
            id: Uuid::new_v4(),
            filename: filename.into(),
            content_type: audio.content_type,
            bytes: audio.bytes,
            created_at: Utc::now(),
        };
        let id = artifact.id;

        tracing::debug!(
            artifact_id = %id,
            filename = %artifact.filename,
            audio_size = artifact.bytes.len(),
            "Artifact registered"
        );
        self.artifacts.write().insert(id, Arc::new(artifact));

        ArtifactHandle {
            id,
            store: self.clone(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Artifact>> {
        self.artifacts.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, id: Uuid) {
        if let Some(artifact) = self.artifacts.write().remove(&id) {
            tracing::debug!(
                artifact_id = %id,
                audio_size = artifact.bytes.len(),
                "Artifact released"
            );
        }
    }
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("artifacts", &self.len())
            .finish()
    }
}

/// Sole owner of one stored artifact. Dropping it frees the audio.
pub struct ArtifactHandle {
    id: Uuid,
    store: ArtifactStore,
}

impl ArtifactHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn artifact(&self) -> Option<Arc<Artifact>> {
        self.store.get(self.id)
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        self.store.release(self.id);
    }
}

impl fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArtifactHandle").field(&self.id).finish()
    }
}
