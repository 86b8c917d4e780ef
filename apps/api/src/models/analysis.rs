//! Structured candidate analysis as returned by the model service.
//!
//! Field names follow the JSON schema sent with every analysis request
//! (camelCase), so the model's output deserializes directly into these types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    Technical,
    Soft,
    Domain,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relevance {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
    /// Estimated from work history context.
    #[serde(default)]
    pub years_of_experience: Option<f64>,
    pub relevance: Relevance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub role: String,
    pub company: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// One immutable analysis snapshot. Never patched in place: a re-analysis
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub candidate_name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    /// Best-fit job title, e.g. "Senior Frontend Developer".
    #[serde(default)]
    pub role_match: String,
    /// 0 – 100
    pub match_score: f64,
    #[serde(default)]
    pub summary: String,
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    pub experience: Vec<WorkExperience>,
    pub reasoning: String,
    #[serde(default)]
    pub years_of_experience: f64,
}
