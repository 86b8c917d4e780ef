//! Analysis Orchestrator: drives entries through `idle → analyzing → {completed | error}`.
//!
//! Flow: validate → select working set → optimistic flip to `analyzing`
//! (one write guard, busy flag set) → one task per entry → each task writes
//! its own outcome back by id → supervisor clears the busy flag once every
//! task has settled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entry::{EntryState, SourceFile};
use crate::pipeline::model_service::ResumeAnalyzer;
use crate::pipeline::store::{EntryPatch, PipelineStore};

/// Recorded when a failure carries no message of its own.
pub const GENERIC_ANALYSIS_ERROR: &str = "Failed to analyze";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AnalysisOptions {
    /// Also re-analyze entries that already completed.
    #[serde(default)]
    pub rerun_completed: bool,
}

/// What a "run analysis" action picked up.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDispatch {
    /// Entries flipped to `analyzing` and sent to the model.
    pub dispatched: Vec<Uuid>,
    /// Eligible entries left untouched because they have no source bytes.
    pub skipped: Vec<Uuid>,
}

struct Job {
    id: Uuid,
    source: SourceFile,
}

/// Starts an analysis run over the whole pipeline.
///
/// Returns once the optimistic transition is applied and every task is
/// spawned. The returned handle resolves when the whole batch has settled.
pub async fn start_analysis(
    store: &PipelineStore,
    analyzer: Arc<dyn ResumeAnalyzer>,
    options: AnalysisOptions,
) -> Result<(AnalysisDispatch, JoinHandle<()>), AppError> {
    let (job_description, jobs, skipped) = store
        .transact(|state| {
            if state.analysis_in_flight() {
                return Err(AppError::analysis_in_progress());
            }
            let job_description = state.job_description().trim().to_string();
            if job_description.is_empty() {
                return Err(AppError::Validation(
                    "Please enter a job description first.".to_string(),
                ));
            }

            let mut jobs = Vec::new();
            let mut skipped = Vec::new();
            for entry in state.entries() {
                if !entry.state.is_reanalyzable(options.rerun_completed) {
                    continue;
                }
                match &entry.source {
                    Some(source) => jobs.push(Job {
                        id: entry.id,
                        source: source.clone(),
                    }),
                    None => skipped.push(entry.id),
                }
            }

            for job in &jobs {
                state.apply(job.id, EntryPatch::state(EntryState::Analyzing));
            }
            state.set_analysis_in_flight(!jobs.is_empty());

            Ok((job_description, jobs, skipped))
        })
        .await?;

    let dispatch = AnalysisDispatch {
        dispatched: jobs.iter().map(|j| j.id).collect(),
        skipped,
    };
    info!(
        dispatched = dispatch.dispatched.len(),
        skipped = dispatch.skipped.len(),
        "Starting analysis run"
    );

    let job_description: Arc<str> = Arc::from(job_description);
    let tasks: Vec<(Uuid, JoinHandle<()>)> = jobs
        .into_iter()
        .map(|job| {
            let store = store.clone();
            let analyzer = Arc::clone(&analyzer);
            let job_description = Arc::clone(&job_description);
            let entry_id = job.id;
            let handle = tokio::spawn(async move {
                analyze_entry(&store, analyzer.as_ref(), job, &job_description).await;
            });
            (entry_id, handle)
        })
        .collect();

    let store = store.clone();
    let settled = tokio::spawn(async move {
        let dispatched = tasks.len();
        for (entry_id, handle) in tasks {
            if let Err(e) = handle.await {
                // A panicking task never wrote its outcome; settle it here.
                error!(entry_id = %entry_id, "Analysis task failed: {e}");
                settle(
                    &store,
                    entry_id,
                    EntryState::Error {
                        error_message: GENERIC_ANALYSIS_ERROR.to_string(),
                    },
                )
                .await;
            }
        }
        if dispatched > 0 {
            store
                .transact(|state| state.set_analysis_in_flight(false))
                .await;
            info!(dispatched, "Analysis run settled");
        }
    });

    Ok((dispatch, settled))
}

async fn analyze_entry(
    store: &PipelineStore,
    analyzer: &dyn ResumeAnalyzer,
    job: Job,
    job_description: &str,
) {
    debug!(entry_id = %job.id, file_name = %job.source.file_name, "Dispatching analysis");

    let outcome = match analyzer.analyze(&job.source, job_description).await {
        Ok(result) => {
            info!(
                entry_id = %job.id,
                match_score = result.match_score,
                "Analysis completed"
            );
            EntryState::Completed { result }
        }
        Err(e) => {
            warn!(entry_id = %job.id, "Analysis failed: {e}");
            let message = e.to_string();
            EntryState::Error {
                error_message: if message.trim().is_empty() {
                    GENERIC_ANALYSIS_ERROR.to_string()
                } else {
                    message
                },
            }
        }
    };

    settle(store, job.id, outcome).await;
}

/// Writes a terminal state for one entry, but only if it is still `analyzing`.
async fn settle(store: &PipelineStore, id: Uuid, outcome: EntryState) {
    let applied = store
        .transact(|state| {
            let still_analyzing = state
                .entry(id)
                .map(|e| e.state == EntryState::Analyzing)
                .unwrap_or(false);
            still_analyzing && state.apply(id, EntryPatch::state(outcome))
        })
        .await;
    if !applied {
        debug!(entry_id = %id, "Discarding analysis outcome for removed entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::entry::EntryStatus;
    use crate::pipeline::test_support::{
        analysis, completed_entry, idle_entry, sourceless_entry, ScriptedAnalyzer,
    };

    async fn store_with_jd(jd: &str) -> PipelineStore {
        let store = PipelineStore::new();
        store.set_job_description(jd.to_string()).await;
        store
    }

    fn status_of(snapshot: &crate::pipeline::store::PipelineSnapshot, id: Uuid) -> EntryStatus {
        snapshot
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.state.status())
            .unwrap()
    }

    #[tokio::test]
    async fn test_blank_job_description_changes_nothing() {
        let store = store_with_jd("   \n").await;
        let ids: Vec<_> = store
            .add_entries(vec![
                crate::pipeline::test_support::pdf("a.pdf"),
                crate::pipeline::test_support::pdf("b.pdf"),
            ])
            .await
            .iter()
            .map(|e| e.id)
            .collect();
        let analyzer = Arc::new(ScriptedAnalyzer::default());

        let err = start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let snapshot = store.snapshot().await;
        assert!(!snapshot.analysis_in_flight);
        for id in ids {
            assert_eq!(status_of(&snapshot, id), EntryStatus::Idle);
        }
        assert!(analyzer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_only_idle_and_error_entries_are_dispatched() {
        let store = store_with_jd("Senior frontend engineer").await;

        let idle = idle_entry("idle.pdf");
        let mut errored = idle_entry("error.pdf");
        errored.state = EntryState::Error {
            error_message: "previous failure".into(),
        };
        let done = completed_entry("done.pdf", analysis("Done", 70.0, &[]));
        let mut busy = idle_entry("busy.pdf");
        busy.state = EntryState::Analyzing;
        let ids = [idle.id, errored.id, done.id, busy.id];
        for entry in [idle, errored, done.clone(), busy] {
            store.insert_entry(entry).await;
        }

        let analyzer = Arc::new(
            ScriptedAnalyzer::default()
                .succeed("idle.pdf", analysis("Idle", 88.0, &[]))
                .succeed("error.pdf", analysis("Retry", 61.0, &[])),
        );

        let (dispatch, settled) =
            start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
                .await
                .unwrap();
        assert_eq!(dispatch.dispatched, vec![ids[0], ids[1]]);
        assert!(dispatch.skipped.is_empty());

        settled.await.unwrap();

        let mut calls = analyzer.calls();
        calls.sort();
        assert_eq!(calls, ["error.pdf", "idle.pdf"]);

        let snapshot = store.snapshot().await;
        assert_eq!(status_of(&snapshot, ids[0]), EntryStatus::Completed);
        assert_eq!(status_of(&snapshot, ids[1]), EntryStatus::Completed);
        assert_eq!(snapshot.entries[2].state, done.state);
        assert_eq!(status_of(&snapshot, ids[3]), EntryStatus::Analyzing);
        assert!(!snapshot.analysis_in_flight);
    }

    #[tokio::test]
    async fn test_optimistic_flip_is_visible_before_any_call_settles() {
        let store = store_with_jd("Backend role").await;
        let mut retry = idle_entry("retry.pdf");
        retry.state = EntryState::Error {
            error_message: "old".into(),
        };
        let retry_id = retry.id;
        store.insert_entry(retry).await;

        let analyzer = Arc::new(ScriptedAnalyzer::default().fail("retry.pdf", "still broken"));
        let gate = analyzer.gate("retry.pdf");

        let (_, settled) = start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
            .await
            .unwrap();

        let during = store.snapshot().await;
        assert!(during.analysis_in_flight);
        assert_eq!(during.entries[0].state, EntryState::Analyzing);

        let again = start_analysis(&store, analyzer.clone(), AnalysisOptions::default()).await;
        assert!(matches!(again, Err(AppError::Conflict { .. })));

        gate.notify_one();
        settled.await.unwrap();

        let after = store.snapshot().await;
        assert!(!after.analysis_in_flight);
        match &after.entries[0].state {
            EntryState::Error { error_message } => assert!(error_message.contains("still broken")),
            other => panic!("expected error state, got {other:?}"),
        }
        assert_eq!(after.entries[0].id, retry_id);
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_settle_out_of_order() {
        let store = store_with_jd("Full stack").await;
        let created = store
            .add_entries(vec![
                crate::pipeline::test_support::pdf("a.pdf"),
                crate::pipeline::test_support::pdf("b.pdf"),
            ])
            .await;
        let (a, b) = (created[0].id, created[1].id);

        let analyzer = Arc::new(
            ScriptedAnalyzer::default()
                .fail("a.pdf", "model overloaded")
                .succeed("b.pdf", analysis("Bea", 81.0, &["Go"])),
        );
        let gate_a = analyzer.gate("a.pdf");

        let (_, settled) = start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
            .await
            .unwrap();

        // b settles while a is still held back
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                let snapshot = store.snapshot().await;
                if status_of(&snapshot, b) == EntryStatus::Completed {
                    assert_eq!(status_of(&snapshot, a), EntryStatus::Analyzing);
                    assert!(snapshot.analysis_in_flight);
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        gate_a.notify_one();
        settled.await.unwrap();

        let a_entry = store.entry(a).await.unwrap();
        let b_entry = store.entry(b).await.unwrap();
        match a_entry.state {
            EntryState::Error { error_message } => {
                assert!(error_message.contains("model overloaded"))
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(b_entry.state.result().unwrap().candidate_name, "Bea");
    }

    #[tokio::test]
    async fn test_retry_after_partial_failure_only_redispatches_failures() {
        let store = store_with_jd("Data engineer").await;
        store
            .add_entries(vec![
                crate::pipeline::test_support::pdf("ok.pdf"),
                crate::pipeline::test_support::pdf("flaky.pdf"),
            ])
            .await;

        let first = Arc::new(
            ScriptedAnalyzer::default()
                .succeed("ok.pdf", analysis("Ok", 90.0, &[]))
                .fail("flaky.pdf", "timeout upstream"),
        );
        let (_, settled) = start_analysis(&store, first, AnalysisOptions::default())
            .await
            .unwrap();
        settled.await.unwrap();

        let second = Arc::new(
            ScriptedAnalyzer::default().succeed("flaky.pdf", analysis("Flaky", 72.0, &[])),
        );
        let (dispatch, settled) =
            start_analysis(&store, second.clone(), AnalysisOptions::default())
                .await
                .unwrap();
        settled.await.unwrap();

        assert_eq!(dispatch.dispatched.len(), 1);
        assert_eq!(second.calls(), ["flaky.pdf"]);
        let snapshot = store.snapshot().await;
        assert!(snapshot
            .entries
            .iter()
            .all(|e| e.state.status() == EntryStatus::Completed));
        assert_eq!(snapshot.entries[0].state.result().unwrap().candidate_name, "Ok");
    }

    #[tokio::test]
    async fn test_rerun_replaces_completed_result_wholesale() {
        let store = store_with_jd("Designer").await;
        let done = completed_entry("cv.pdf", analysis("Old", 40.0, &["Figma"]));
        let id = done.id;
        store.insert_entry(done).await;

        let analyzer =
            Arc::new(ScriptedAnalyzer::default().succeed("cv.pdf", analysis("New", 75.0, &[])));

        let (dispatch, settled) = start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
            .await
            .unwrap();
        settled.await.unwrap();
        assert!(dispatch.dispatched.is_empty());
        assert!(analyzer.calls().is_empty());

        let (dispatch, settled) = start_analysis(
            &store,
            analyzer.clone(),
            AnalysisOptions {
                rerun_completed: true,
            },
        )
        .await
        .unwrap();
        settled.await.unwrap();

        assert_eq!(dispatch.dispatched, vec![id]);
        let result = store.entry(id).await.unwrap().state.result().cloned().unwrap();
        assert_eq!(result, analysis("New", 75.0, &[]));
    }

    #[tokio::test]
    async fn test_sourceless_entries_keep_their_status() {
        let store = store_with_jd("Any").await;
        let seeded = sourceless_entry("seed.pdf", EntryState::Idle);
        let seeded_id = seeded.id;
        store.insert_entry(seeded).await;

        let analyzer = Arc::new(ScriptedAnalyzer::default());
        let (dispatch, settled) = start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
            .await
            .unwrap();
        settled.await.unwrap();

        assert!(dispatch.dispatched.is_empty());
        assert_eq!(dispatch.skipped, vec![seeded_id]);
        assert!(analyzer.calls().is_empty());
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.entries[0].state, EntryState::Idle);
        assert!(!snapshot.analysis_in_flight);
    }

    #[tokio::test]
    async fn test_removed_entry_outcome_is_discarded() {
        let store = store_with_jd("Any").await;
        let created = store
            .add_entries(vec![
                crate::pipeline::test_support::pdf("gone.pdf"),
                crate::pipeline::test_support::pdf("kept.pdf"),
            ])
            .await;

        let analyzer = Arc::new(
            ScriptedAnalyzer::default()
                .succeed("gone.pdf", analysis("Gone", 60.0, &[]))
                .succeed("kept.pdf", analysis("Kept", 65.0, &[])),
        );
        let gate = analyzer.gate("gone.pdf");

        let (_, settled) = start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
            .await
            .unwrap();
        assert!(store.remove_entry(created[0].id).await);
        gate.notify_one();
        settled.await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].id, created[1].id);
        assert_eq!(snapshot.entries[0].state.status(), EntryStatus::Completed);
    }

    #[tokio::test]
    async fn test_panicking_task_settles_with_generic_error_and_clears_busy() {
        let store = store_with_jd("Platform engineer").await;
        let created = store
            .add_entries(vec![
                crate::pipeline::test_support::pdf("crash.pdf"),
                crate::pipeline::test_support::pdf("fine.pdf"),
            ])
            .await;
        let (crash, fine) = (created[0].id, created[1].id);

        let analyzer = Arc::new(
            ScriptedAnalyzer::default()
                .panic_on("crash.pdf")
                .succeed("fine.pdf", analysis("Fine", 66.0, &[])),
        );
        let (dispatch, settled) =
            start_analysis(&store, analyzer.clone(), AnalysisOptions::default())
                .await
                .unwrap();
        assert_eq!(dispatch.dispatched, vec![crash, fine]);
        settled.await.unwrap();

        let snapshot = store.snapshot().await;
        assert!(!snapshot.analysis_in_flight);
        assert_eq!(
            store.entry(crash).await.unwrap().state,
            EntryState::Error {
                error_message: GENERIC_ANALYSIS_ERROR.to_string()
            }
        );
        assert_eq!(status_of(&snapshot, fine), EntryStatus::Completed);

        // the crashed entry is retryable on the next run
        let retry = Arc::new(
            ScriptedAnalyzer::default().succeed("crash.pdf", analysis("Crash", 70.0, &[])),
        );
        let (dispatch, settled) = start_analysis(&store, retry, AnalysisOptions::default())
            .await
            .unwrap();
        settled.await.unwrap();
        assert_eq!(dispatch.dispatched, vec![crash]);
        assert_eq!(
            store.entry(crash).await.unwrap().state.status(),
            EntryStatus::Completed
        );
    }
}
