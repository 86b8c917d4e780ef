use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::model_service::{CandidateChat, ResumeAnalyzer};
use crate::pipeline::store::PipelineStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: PipelineStore,
    /// Resume analysis backend. Production: the shared `LlmClient`.
    pub analyzer: Arc<dyn ResumeAnalyzer>,
    /// Candidate chat backend. Production: the shared `LlmClient`.
    pub chat: Arc<dyn CandidateChat>,
    pub config: Config,
}
