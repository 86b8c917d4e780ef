//! Derived, read-only views over a pipeline snapshot: aggregate statistics
//! and the ranked candidate list. Recomputed on every request, never stored.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::analysis::AnalysisResult;
use crate::models::entry::{EntryStatus, ResumeEntry};

/// Scores at or above this count as top candidates.
pub const TOP_CANDIDATE_THRESHOLD: f64 = 80.0;
const MODERATE_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSkillCount {
    pub skill: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    pub candidate_count: usize,
    pub completed_count: usize,
    pub analyzing_count: usize,
    pub error_count: usize,
    /// Rounded mean over completed entries; 0 when none are completed.
    pub average_match_score: u32,
    pub top_candidate_count: usize,
    /// Most frequent missing skill; earliest seen wins a tie. None when nothing is missing.
    pub top_missing_skill: Option<MissingSkillCount>,
}

fn completed_results(entries: &[ResumeEntry]) -> impl Iterator<Item = &AnalysisResult> + '_ {
    entries.iter().filter_map(|e| e.state.result())
}

pub fn compute_stats(entries: &[ResumeEntry]) -> PipelineStats {
    let results: Vec<&AnalysisResult> = completed_results(entries).collect();

    let average_match_score = if results.is_empty() {
        0
    } else {
        let total: f64 = results.iter().map(|r| r.match_score).sum();
        (total / results.len() as f64).round().max(0.0) as u32
    };

    let top_candidate_count = results
        .iter()
        .filter(|r| r.match_score >= TOP_CANDIDATE_THRESHOLD)
        .count();

    let count_status = |status: EntryStatus| {
        entries
            .iter()
            .filter(|e| e.state.status() == status)
            .count()
    };

    PipelineStats {
        candidate_count: entries.len(),
        completed_count: results.len(),
        analyzing_count: count_status(EntryStatus::Analyzing),
        error_count: count_status(EntryStatus::Error),
        average_match_score,
        top_candidate_count,
        top_missing_skill: most_common_missing_skill(&results),
    }
}

fn most_common_missing_skill(results: &[&AnalysisResult]) -> Option<MissingSkillCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for skill in results.iter().flat_map(|r| r.missing_skills.iter()) {
        let count = counts.entry(skill.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(skill.as_str());
        }
        *count += 1;
    }

    let mut best: Option<MissingSkillCount> = None;
    for skill in first_seen {
        let count = counts[skill];
        // strict > keeps the earliest skill on ties
        if best.as_ref().map_or(true, |b| count > b.count) {
            best = Some(MissingSkillCount {
                skill: skill.to_string(),
                count,
            });
        }
    }
    best
}

// ────────────────────────────────────────────────────────────────────────────
// Ranking
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= TOP_CANDIDATE_THRESHOLD {
            ScoreBand::Strong
        } else if score >= MODERATE_THRESHOLD {
            ScoreBand::Moderate
        } else {
            ScoreBand::Weak
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub id: Uuid,
    pub display_name: String,
    pub candidate_name: String,
    pub role_match: String,
    pub match_score: f64,
    pub band: ScoreBand,
}

/// Completed entries by descending score. The sort is stable, so equal
/// scores keep pipeline order.
pub fn rank_candidates(entries: &[ResumeEntry]) -> Vec<RankedCandidate> {
    let mut completed: Vec<(&ResumeEntry, &AnalysisResult)> = entries
        .iter()
        .filter_map(|e| e.state.result().map(|r| (e, r)))
        .collect();
    completed.sort_by(|a, b| b.1.match_score.total_cmp(&a.1.match_score));

    completed
        .into_iter()
        .enumerate()
        .map(|(i, (entry, result))| RankedCandidate {
            rank: i + 1,
            id: entry.id,
            display_name: entry.display_name.clone(),
            candidate_name: result.candidate_name.clone(),
            role_match: result.role_match.clone(),
            match_score: result.match_score,
            band: ScoreBand::for_score(result.match_score),
        })
        .collect()
}
