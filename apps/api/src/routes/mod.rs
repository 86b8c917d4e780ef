pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Pipeline API
        .route("/api/v1/pipeline", get(handlers::handle_get_pipeline))
        .route(
            "/api/v1/pipeline/job-description",
            put(handlers::handle_set_job_description),
        )
        .route(
            "/api/v1/pipeline/resumes",
            post(handlers::handle_upload_resumes).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/pipeline/resumes/:id",
            get(handlers::handle_get_resume).delete(handlers::handle_remove_resume),
        )
        .route(
            "/api/v1/pipeline/resumes/:id/chat",
            post(handlers::handle_chat),
        )
        .route(
            "/api/v1/pipeline/analysis",
            post(handlers::handle_run_analysis),
        )
        .route("/api/v1/pipeline/stats", get(handlers::handle_get_stats))
        .route("/api/v1/pipeline/ranking", get(handlers::handle_get_ranking))
        .with_state(state)
}
