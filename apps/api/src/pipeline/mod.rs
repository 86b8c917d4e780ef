// Candidate pipeline: store, intake, analysis orchestration, chat, derived views.
// All model calls go through the traits in model_service; only the
// orchestrator and chat adapter write entry state.

pub mod chat;
pub mod handlers;
pub mod intake;
pub mod model_service;
pub mod orchestrator;
pub mod prompts;
pub mod stats;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
