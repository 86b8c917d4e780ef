//! Model service seams for the pipeline.
//!
//! The orchestrator and chat adapter depend on these traits only. `AppState`
//! carries them as `Arc<dyn ...>`; the production implementation is the
//! shared `LlmClient`, and tests substitute scripted fakes.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError, Part};
use crate::models::analysis::AnalysisResult;
use crate::models::chat::{ChatMessage, ChatRole};
use crate::models::entry::SourceFile;
use crate::pipeline::prompts::{render_prompt, ANALYSIS_PROMPT_TEMPLATE, CHAT_PROMPT_TEMPLATE};

/// Reply used when the model answers a chat turn with no text at all.
pub const EMPTY_CHAT_REPLY: &str = "I couldn't generate a response.";

/// Extracts and scores one resume against a job description.
/// Must be safe to call again with the same inputs.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        source: &SourceFile,
        job_description: &str,
    ) -> Result<AnalysisResult, LlmError>;
}

/// Answers one recruiter question about an analyzed candidate.
///
/// `conversation` is the full log so far, ending with the user turn for `message`.
#[async_trait]
pub trait CandidateChat: Send + Sync {
    async fn reply(
        &self,
        grounding: &AnalysisResult,
        conversation: &[ChatMessage],
        message: &str,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl ResumeAnalyzer for LlmClient {
    async fn analyze(
        &self,
        source: &SourceFile,
        job_description: &str,
    ) -> Result<AnalysisResult, LlmError> {
        let parts = [
            Part::inline(source.mime_type.as_str(), &source.bytes),
            Part::text(build_analysis_prompt(job_description)),
        ];
        self.call_json(&parts, &analysis_response_schema()).await
    }
}

#[async_trait]
impl CandidateChat for LlmClient {
    async fn reply(
        &self,
        grounding: &AnalysisResult,
        conversation: &[ChatMessage],
        message: &str,
    ) -> Result<String, LlmError> {
        let prompt = build_chat_prompt(grounding, conversation, message)?;
        let text = self.call_text(&prompt).await?;
        Ok(text.unwrap_or_else(|| EMPTY_CHAT_REPLY.to_string()))
    }
}

pub fn build_analysis_prompt(job_description: &str) -> String {
    render_prompt(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("job_description", job_description),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Flattens the whole conversation into one prompt. The history is replayed
/// as text on every turn; no model-side session is kept.
pub fn build_chat_prompt(
    grounding: &AnalysisResult,
    conversation: &[ChatMessage],
    message: &str,
) -> Result<String, LlmError> {
    let candidate_json = serde_json::to_string(grounding)?;

    let mut lines: Vec<String> = conversation
        .iter()
        .map(|m| format!("{}: {}", speaker(m.role), m.text))
        .collect();
    let ends_with_message = conversation
        .last()
        .map(|m| m.role == ChatRole::User && m.text == message)
        .unwrap_or(false);
    if !ends_with_message {
        lines.push(format!("{}: {}", speaker(ChatRole::User), message));
    }

    let history = lines.join("\n");
    Ok(render_prompt(
        CHAT_PROMPT_TEMPLATE,
        &[
            ("candidate_json", &candidate_json),
            ("grounding", GROUNDING_INSTRUCTION),
            ("history", &history),
        ],
    ))
}

fn speaker(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "USER",
        ChatRole::Assistant => "MODEL",
    }
}

/// Gemini response schema mirroring `AnalysisResult`.
pub fn analysis_response_schema() -> Value {
    let nullable_string = json!({ "type": "STRING", "nullable": true });
    json!({
        "type": "OBJECT",
        "properties": {
            "candidateName": { "type": "STRING" },
            "yearsOfExperience": { "type": "NUMBER", "description": "Total years of relevant experience" },
            "contact": {
                "type": "OBJECT",
                "properties": {
                    "email": nullable_string,
                    "phone": nullable_string,
                    "linkedin": nullable_string,
                    "portfolio": nullable_string,
                    "location": nullable_string
                }
            },
            "roleMatch": { "type": "STRING", "description": "The most fitting job title" },
            "matchScore": { "type": "NUMBER" },
            "summary": { "type": "STRING" },
            "skills": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "category": { "type": "STRING", "enum": ["Technical", "Soft", "Domain", "Tool"] },
                        "yearsOfExperience": { "type": "NUMBER", "nullable": true },
                        "relevance": { "type": "STRING", "enum": ["High", "Medium", "Low"] }
                    }
                }
            },
            "missingSkills": { "type": "ARRAY", "items": { "type": "STRING" } },
            "education": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "degree": { "type": "STRING" },
                        "institution": { "type": "STRING" },
                        "year": nullable_string
                    }
                }
            },
            "experience": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "role": { "type": "STRING" },
                        "company": { "type": "STRING" },
                        "duration": { "type": "STRING" },
                        "highlights": { "type": "ARRAY", "items": { "type": "STRING" } }
                    }
                }
            },
            "reasoning": { "type": "STRING" }
        },
        "required": ["candidateName", "matchScore", "skills", "reasoning", "experience"]
    })
}
