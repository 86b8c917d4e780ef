//! Resume Pipeline Store: the single source of truth for the candidate list
//! and the active job description.
//!
//! Readers get owned snapshots. Writes go through id-keyed patches only; the
//! write side is visible to the orchestrator and chat adapter alone.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::chat::ChatMessage;
use crate::models::entry::{EntryState, ResumeEntry, SourceFile};

/// Partial update for one entry. Conversation messages are appended, never replaced.
#[derive(Debug, Default)]
pub(super) struct EntryPatch {
    pub state: Option<EntryState>,
    pub append: Vec<ChatMessage>,
    pub awaiting_reply: Option<bool>,
}

impl EntryPatch {
    pub fn state(state: EntryState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSnapshot {
    pub job_description: String,
    pub analysis_in_flight: bool,
    pub entries: Vec<ResumeEntry>,
}

#[derive(Debug, Default)]
pub(super) struct PipelineState {
    job_description: String,
    entries: Vec<ResumeEntry>,
    analysis_in_flight: bool,
}

impl PipelineState {
    pub fn entries(&self) -> &[ResumeEntry] {
        &self.entries
    }

    pub fn entry(&self, id: Uuid) -> Option<&ResumeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn analysis_in_flight(&self) -> bool {
        self.analysis_in_flight
    }

    pub fn set_analysis_in_flight(&mut self, in_flight: bool) {
        self.analysis_in_flight = in_flight;
    }

    /// Applies a patch in place. Position and identity are untouched.
    /// Returns false when the id is unknown (e.g. removed mid-flight).
    pub fn apply(&mut self, id: Uuid, patch: EntryPatch) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if let Some(state) = patch.state {
            entry.state = state;
        }
        entry.conversation.extend(patch.append);
        if let Some(awaiting) = patch.awaiting_reply {
            entry.awaiting_reply = awaiting;
        }
        true
    }
}

#[derive(Clone, Default)]
pub struct PipelineStore {
    inner: Arc<RwLock<PipelineState>>,
}

impl PipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one idle entry per file, in input order. No dedup.
    pub async fn add_entries(&self, files: Vec<SourceFile>) -> Vec<ResumeEntry> {
        let created: Vec<ResumeEntry> = files.into_iter().map(ResumeEntry::from_file).collect();
        let mut state = self.inner.write().await;
        state.entries.extend(created.iter().cloned());
        created
    }

    /// Idempotent: unknown ids are ignored. Returns whether anything was removed.
    pub async fn remove_entry(&self, id: Uuid) -> bool {
        let mut state = self.inner.write().await;
        let before = state.entries.len();
        state.entries.retain(|e| e.id != id);
        state.entries.len() != before
    }

    pub async fn set_job_description(&self, text: String) {
        self.inner.write().await.job_description = text;
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        let state = self.inner.read().await;
        PipelineSnapshot {
            job_description: state.job_description.clone(),
            analysis_in_flight: state.analysis_in_flight,
            entries: state.entries.clone(),
        }
    }

    pub async fn entry(&self, id: Uuid) -> Option<ResumeEntry> {
        self.inner.read().await.entry(id).cloned()
    }

    pub(super) async fn update_entry(&self, id: Uuid, patch: EntryPatch) -> bool {
        self.inner.write().await.apply(id, patch)
    }

    /// Runs `f` under a single write guard, so a multi-entry transition is
    /// never observed half-applied.
    pub(super) async fn transact<R>(&self, f: impl FnOnce(&mut PipelineState) -> R) -> R {
        let mut state = self.inner.write().await;
        f(&mut state)
    }

    #[cfg(test)]
    pub(crate) async fn insert_entry(&self, entry: ResumeEntry) {
        self.inner.write().await.entries.push(entry);
    }
}
