use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    domain::{
        ingestion::{FileIngestion, IngestedFile},
        tts::{
            dto::{BatchCreatedResponse, BatchRequest, BatchView, RejectedFile},
            plan_batch, BatchService, CancelToken, TtsServiceError,
        },
    },
    error::{AppError, AppResult},
    infrastructure::{
        auth::ApiCredential,
        repositories::{BatchRecord, BatchRepository, RecordObserver, SharedBatch},
    },
};

pub struct BatchController {
    batch_service: Arc<BatchService>,
    batch_repo: BatchRepository,
    ingestion: FileIngestion,
}

impl BatchController {
    pub fn new(
        batch_service: Arc<BatchService>,
        batch_repo: BatchRepository,
        ingestion: FileIngestion,
    ) -> Self {
        Self {
            batch_service,
            batch_repo,
            ingestion,
        }
    }

    /// POST /api/batches - Start converting text and files in the background
    pub async fn create(
        State(controller): State<Arc<BatchController>>,
        Extension(credential): Extension<ApiCredential>,
        Json(request): Json<BatchRequest>,
    ) -> AppResult<(StatusCode, Json<BatchCreatedResponse>)> {
        let (accepted, rejected_files) = controller.ingest(&request);

        if request.text.is_none() && accepted.is_empty() {
            let message = if rejected_files.is_empty() {
                "provide text or at least one .txt file".to_string()
            } else {
                format!("no usable files ({} rejected)", rejected_files.len())
            };
            return Err(AppError::BadRequest(message));
        }

        let credential = credential
            .as_deref()
            .map(str::to_string)
            .ok_or(TtsServiceError::MissingCredential)?;

        let jobs = plan_batch(request.text.as_deref(), &accepted, request.merge_files);
        let cancel = CancelToken::new();
        let batch = controller
            .batch_repo
            .insert(BatchRecord::new(&jobs, cancel.clone()))
            .await;
        let view = batch.read().view();

        tracing::info!(
            batch_id = %view.id,
            job_count = jobs.len(),
            rejected_files = rejected_files.len(),
            merge_files = request.merge_files,
            "Batch created"
        );

        let batch_service = controller.batch_service.clone();
        let voice = request.voice;
        let span = tracing::info_span!("batch", batch_id = %view.id);
        tokio::spawn(
            async move {
                let mut observer = RecordObserver::new(batch.clone());
                let outcome = batch_service
                    .convert_batch(
                        jobs,
                        Some(&credential),
                        voice.as_deref(),
                        &cancel,
                        &mut observer,
                    )
                    .await;
                batch.write().complete(outcome);
            }
            .instrument(span),
        );

        Ok((
            StatusCode::ACCEPTED,
            Json(BatchCreatedResponse {
                batch: view,
                rejected_files,
            }),
        ))
    }

    /// GET /api/batches/:id - Current progress and job states
    pub async fn get(
        State(controller): State<Arc<BatchController>>,
        Path(batch_id): Path<Uuid>,
    ) -> AppResult<Json<BatchView>> {
        let batch = controller.find(batch_id).await?;
        let view = batch.read().view();
        Ok(Json(view))
    }

    /// POST /api/batches/:id/cancel - Stop after the request in flight
    pub async fn cancel(
        State(controller): State<Arc<BatchController>>,
        Path(batch_id): Path<Uuid>,
    ) -> AppResult<(StatusCode, Json<BatchView>)> {
        let batch = controller.find(batch_id).await?;
        let view = {
            let record = batch.read();
            record.cancel_token().cancel();
            record.view()
        };
        tracing::info!(batch_id = %batch_id, "Batch cancellation requested");
        Ok((StatusCode::ACCEPTED, Json(view)))
    }

    /// DELETE /api/batches/:id - Cancel and discard a batch with its audio
    pub async fn delete(
        State(controller): State<Arc<BatchController>>,
        Path(batch_id): Path<Uuid>,
    ) -> AppResult<StatusCode> {
        if !controller.batch_repo.evict(batch_id).await {
            return Err(AppError::NotFound(format!("batch {}", batch_id)));
        }
        tracing::info!(batch_id = %batch_id, "Batch deleted");
        Ok(StatusCode::NO_CONTENT)
    }

    async fn find(&self, batch_id: Uuid) -> AppResult<SharedBatch> {
        self.batch_repo
            .find(batch_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("batch {}", batch_id)))
    }

    fn ingest(&self, request: &BatchRequest) -> (Vec<IngestedFile>, Vec<RejectedFile>) {
        let mut accepted = Vec::with_capacity(request.files.len());
        let mut rejected = Vec::new();

        for file in &request.files {
            match self.ingestion.ingest(&file.filename, file.content.as_bytes()) {
                Ok(ingested) => accepted.push(ingested),
                Err(err) => {
                    tracing::info!(filename = %file.filename, error = %err, "File rejected");
                    rejected.push(RejectedFile {
                        filename: file.filename.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        (accepted, rejected)
    }
}
