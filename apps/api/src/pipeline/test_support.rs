//! Shared fixtures and scripted model-service fakes for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use crate::llm_client::LlmError;
use crate::models::analysis::{
    AnalysisResult, ContactInfo, Relevance, Skill, SkillCategory, WorkExperience,
};
use crate::models::chat::ChatMessage;
use crate::models::entry::{EntryState, ResumeEntry, SourceFile};
use crate::pipeline::model_service::{CandidateChat, ResumeAnalyzer};

pub fn analysis(name: &str, score: f64, missing: &[&str]) -> AnalysisResult {
    AnalysisResult {
        candidate_name: name.to_string(),
        contact: ContactInfo {
            email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
            ..Default::default()
        },
        role_match: "Frontend Engineer".to_string(),
        match_score: score,
        summary: format!("{name} summary"),
        skills: vec![Skill {
            name: "React".to_string(),
            category: SkillCategory::Technical,
            years_of_experience: Some(3.0),
            relevance: Relevance::High,
        }],
        missing_skills: missing.iter().map(|s| s.to_string()).collect(),
        education: vec![],
        experience: vec![WorkExperience {
            role: "Developer".to_string(),
            company: "Acme".to_string(),
            duration: "2020-Present".to_string(),
            highlights: vec!["Shipped things".to_string()],
        }],
        reasoning: "Fixture".to_string(),
        years_of_experience: 4.0,
    }
}

pub fn pdf(name: &str) -> SourceFile {
    SourceFile {
        file_name: name.to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: Bytes::from(format!("%PDF-1.4 {name}")),
    }
}

pub fn idle_entry(name: &str) -> ResumeEntry {
    ResumeEntry::from_file(pdf(name))
}

pub fn completed_entry(name: &str, result: AnalysisResult) -> ResumeEntry {
    let mut entry = idle_entry(name);
    entry.state = EntryState::Completed { result };
    entry
}

/// An entry with no backing bytes, like a seeded demo candidate.
pub fn sourceless_entry(name: &str, state: EntryState) -> ResumeEntry {
    let mut entry = idle_entry(name);
    entry.source = None;
    entry.state = state;
    entry
}

// ────────────────────────────────────────────────────────────────────────────
// Fakes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum Scripted<T> {
    Ok(T),
    Fail(String),
    Panic,
}

/// Analyzer keyed by file name. Unscripted files fail. A gated file blocks
/// until its gate is opened, which lets tests choose settlement order.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    outcomes: Mutex<HashMap<String, Scripted<AnalysisResult>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    pub fn succeed(self, file_name: &str, result: AnalysisResult) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Scripted::Ok(result));
        self
    }

    pub fn fail(self, file_name: &str, message: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Scripted::Fail(message.to_string()));
        self
    }

    pub fn panic_on(self, file_name: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Scripted::Panic);
        self
    }

    pub fn gate(&self, file_name: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(file_name.to_string())
            .or_default()
            .clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeAnalyzer for ScriptedAnalyzer {
    async fn analyze(
        &self,
        source: &SourceFile,
        _job_description: &str,
    ) -> Result<AnalysisResult, LlmError> {
        self.calls.lock().unwrap().push(source.file_name.clone());
        let gate = self.gates.lock().unwrap().get(&source.file_name).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let outcome = self.outcomes.lock().unwrap().get(&source.file_name).cloned();
        match outcome {
            Some(Scripted::Ok(result)) => Ok(result),
            Some(Scripted::Fail(message)) => Err(LlmError::Api {
                status: 500,
                message,
            }),
            Some(Scripted::Panic) => panic!("scripted analyzer panic for {}", source.file_name),
            None => Err(LlmError::EmptyContent),
        }
    }
}

/// Chat fake answering from a queue of scripted outcomes.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Scripted<String>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, String)>>,
}

impl ScriptedChat {
    pub fn reply_with(self, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Ok(text.to_string()));
        self
    }

    pub fn fail_with(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.to_string()));
        self
    }

    pub fn panic_next(self) -> Self {
        self.replies.lock().unwrap().push_back(Scripted::Panic);
        self
    }

    /// Blocks every reply until the returned gate is notified.
    pub fn gated(&self) -> Arc<Notify> {
        self.gate.lock().unwrap().get_or_insert_with(Default::default).clone()
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateChat for ScriptedChat {
    async fn reply(
        &self,
        _grounding: &AnalysisResult,
        conversation: &[ChatMessage],
        message: &str,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((conversation.to_vec(), message.to_string()));
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ok(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(LlmError::Api {
                status: 503,
                message,
            }),
            Some(Scripted::Panic) => panic!("scripted chat panic"),
            None => Err(LlmError::EmptyContent),
        }
    }
}
