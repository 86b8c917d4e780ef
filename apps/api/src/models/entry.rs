use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::analysis::AnalysisResult;
use crate::models::chat::ChatMessage;

/// Raw resume bytes as received from the upload boundary.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Idle,
    Analyzing,
    Completed,
    Error,
}

/// Lifecycle state of one entry. The result and error message live inside
/// the variant, so status and payload can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryState {
    Idle,
    Analyzing,
    Completed { result: AnalysisResult },
    Error { error_message: String },
}

impl EntryState {
    pub fn status(&self) -> EntryStatus {
        match self {
            EntryState::Idle => EntryStatus::Idle,
            EntryState::Analyzing => EntryStatus::Analyzing,
            EntryState::Completed { .. } => EntryStatus::Completed,
            EntryState::Error { .. } => EntryStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            EntryState::Completed { result } => Some(result),
            _ => None,
        }
    }

    /// Whether a "run analysis" action may pick this entry up.
    /// `Completed` only qualifies on an explicit re-run.
    pub fn is_reanalyzable(&self, rerun_completed: bool) -> bool {
        match self {
            EntryState::Idle | EntryState::Error { .. } => true,
            EntryState::Completed { .. } => rerun_completed,
            EntryState::Analyzing => false,
        }
    }
}

/// One tracked resume submission.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeEntry {
    pub id: Uuid,
    #[serde(skip)]
    pub source: Option<SourceFile>,
    pub display_name: String,
    #[serde(flatten)]
    pub state: EntryState,
    pub conversation: Vec<ChatMessage>,
    /// True while a chat turn for this entry is outstanding.
    pub awaiting_reply: bool,
    pub created_at: DateTime<Utc>,
}

impl ResumeEntry {
    pub fn from_file(file: SourceFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: file.file_name.clone(),
            source: Some(file),
            state: EntryState::Idle,
            conversation: Vec::new(),
            awaiting_reply: false,
            created_at: Utc::now(),
        }
    }
}
