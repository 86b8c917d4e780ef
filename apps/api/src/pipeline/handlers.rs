//! Axum route handlers for the Pipeline API.
//!
//! Handlers only read snapshots or call into the orchestrator and chat
//! adapter; none of them writes entry state directly.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entry::ResumeEntry;
use crate::pipeline::chat::{send_chat_message, ChatTurn};
use crate::pipeline::intake::{accept_pdfs, UploadedFile};
use crate::pipeline::orchestrator::{start_analysis, AnalysisDispatch, AnalysisOptions};
use crate::pipeline::stats::{compute_stats, rank_candidates, PipelineStats, RankedCandidate};
use crate::pipeline::store::PipelineSnapshot;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JobDescriptionRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// File parts received, including any that were dropped as non-PDF.
    pub received: usize,
    pub entries: Vec<ResumeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/pipeline
pub async fn handle_get_pipeline(State(state): State<AppState>) -> Json<PipelineSnapshot> {
    Json(state.pipeline.snapshot().await)
}

/// PUT /api/v1/pipeline/job-description
pub async fn handle_set_job_description(
    State(state): State<AppState>,
    Json(request): Json<JobDescriptionRequest>,
) -> StatusCode {
    state
        .pipeline
        .set_job_description(request.job_description)
        .await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/pipeline/resumes
///
/// Multipart upload. Non-PDF parts are dropped silently; the response lists
/// only the entries that were created.
pub async fn handle_upload_resumes(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        // plain form fields carry no file name
        if field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await?;
        files.push(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }

    let received = files.len();
    let entries = state.pipeline.add_entries(accept_pdfs(files)).await;
    info!("Accepted {}/{} uploaded files", entries.len(), received);

    Ok((StatusCode::CREATED, Json(UploadResponse { received, entries })))
}

/// DELETE /api/v1/pipeline/resumes/:id
///
/// Idempotent: unknown ids also return 204.
pub async fn handle_remove_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    state.pipeline.remove_entry(id).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/pipeline/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeEntry>, AppError> {
    state
        .pipeline
        .entry(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

/// POST /api/v1/pipeline/analysis
///
/// Flips eligible entries to `analyzing` and returns immediately; results
/// land in the pipeline as each call settles. An empty body runs with the
/// default options.
pub async fn handle_run_analysis(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AnalysisDispatch>), AppError> {
    let options = parse_analysis_options(&body)?;
    let (dispatch, _settled) =
        start_analysis(&state.pipeline, state.analyzer.clone(), options).await?;
    Ok((StatusCode::ACCEPTED, Json(dispatch)))
}

fn parse_analysis_options(body: &[u8]) -> Result<AnalysisOptions, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalysisOptions::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid analysis options: {e}")))
}

/// GET /api/v1/pipeline/stats
pub async fn handle_get_stats(State(state): State<AppState>) -> Json<PipelineStats> {
    let snapshot = state.pipeline.snapshot().await;
    Json(compute_stats(&snapshot.entries))
}

/// GET /api/v1/pipeline/ranking
pub async fn handle_get_ranking(State(state): State<AppState>) -> Json<Vec<RankedCandidate>> {
    let snapshot = state.pipeline.snapshot().await;
    Json(rank_candidates(&snapshot.entries))
}

/// POST /api/v1/pipeline/resumes/:id/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatTurn>, AppError> {
    let turn = send_chat_message(&state.pipeline, state.chat.clone(), id, &request.message).await?;
    Ok(Json(turn))
}
