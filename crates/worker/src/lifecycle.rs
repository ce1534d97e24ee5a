//! Job lifecycle controller.
//!
//! Owns every status change after creation:
//!
//! ```text
//! Migration:  DRAFT  --start--> RUNNING --completion--> COMPLETED | FAILED
//! Evaluation: QUEUED --run-->   RUNNING --completion--> DONE      | ERROR
//! ```
//!
//! The trigger (`start`/`run`) is a check-and-set executed inside the
//! repository's per-record lock, so concurrent triggers on one job admit a
//! single winner. The completion is handed to the [`Scheduler`] and applied
//! later as one atomic update.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use promptdash_core::error::CoreError;
use promptdash_core::evaluation::{Evaluation, EvaluationResult, EVALUATION_ENTITY};
use promptdash_core::migration::{Migration, MigrationPrompt, MIGRATION_ENTITY};
use promptdash_core::scoring::{score, RandomSampler, ScoreSampler};
use promptdash_core::status::{validate_transition, EvaluationStatus, MigrationStatus};
use promptdash_core::types::JobId;
use promptdash_db::{EvaluationRepo, MigrationRepo};

use crate::failure::{FailurePolicy, JobKind, NeverFail};
use crate::scheduler::{Scheduler, TaskHandle};

/// Delay between a job being triggered and its completion.
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(2000);

/// Drives migrations and evaluations through their state machines.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct LifecycleController {
    migrations: Arc<MigrationRepo>,
    evaluations: Arc<EvaluationRepo>,
    scheduler: Arc<dyn Scheduler>,
    sampler: Arc<dyn ScoreSampler>,
    failures: Arc<dyn FailurePolicy>,
    completion_delay: Duration,
}

impl LifecycleController {
    /// Controller with random scoring, no injected failures and the default
    /// completion delay.
    pub fn new(
        migrations: Arc<MigrationRepo>,
        evaluations: Arc<EvaluationRepo>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            migrations,
            evaluations,
            scheduler,
            sampler: Arc::new(RandomSampler),
            failures: Arc::new(NeverFail),
            completion_delay: DEFAULT_COMPLETION_DELAY,
        }
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn ScoreSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_failure_policy(mut self, failures: Arc<dyn FailurePolicy>) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    // -----------------------------------------------------------------------
    // Migrations
    // -----------------------------------------------------------------------

    /// Move a DRAFT migration to RUNNING and schedule its completion.
    ///
    /// Fails with `NotFound` for an unknown id and `InvalidTransition` if the
    /// migration is not in DRAFT.
    pub async fn start_migration(&self, id: JobId) -> Result<TaskHandle, CoreError> {
        let started = self
            .migrations
            .update(
                id,
                Box::new(move |m: &mut Migration| {
                    validate_transition(MIGRATION_ENTITY, id, m.status, MigrationStatus::Running)?;
                    m.status = MigrationStatus::Running;
                    Ok(())
                }),
            )
            .await
            .inspect_err(|e| log_rejected(JobKind::Migration, id, e))?;

        tracing::info!(
            migration_id = %id,
            prompts = started.prompts.len(),
            target_model = %started.target_model,
            delay_ms = self.completion_delay.as_millis() as u64,
            "Migration started",
        );

        let this = self.clone();
        let task = async move { this.complete_migration(id).await }.boxed();
        Ok(self.scheduler.schedule(self.completion_delay, task))
    }

    async fn complete_migration(&self, id: JobId) {
        let failure = self.failures.check(JobKind::Migration, id);

        let result = self
            .migrations
            .update(
                id,
                Box::new(move |m: &mut Migration| {
                    if let Some(reason) = failure {
                        validate_transition(MIGRATION_ENTITY, id, m.status, MigrationStatus::Failed)?;
                        m.status = MigrationStatus::Failed;
                        m.error_message = Some(reason);
                        return Ok(());
                    }

                    validate_transition(
                        MIGRATION_ENTITY,
                        id,
                        m.status,
                        MigrationStatus::Completed,
                    )?;
                    let prompts: Vec<MigrationPrompt> = m
                        .prompts
                        .iter()
                        .map(|p| MigrationPrompt {
                            migrated: Some(m.migrated_text(&p.source)),
                            ..p.clone()
                        })
                        .collect();
                    m.prompts = prompts;
                    m.status = MigrationStatus::Completed;
                    Ok(())
                }),
            )
            .await;

        match result {
            Ok(m) if m.status == MigrationStatus::Failed => tracing::warn!(
                migration_id = %id,
                reason = m.error_message.as_deref().unwrap_or_default(),
                "Migration failed",
            ),
            Ok(m) => tracing::info!(
                migration_id = %id,
                prompts = m.prompts.len(),
                "Migration completed",
            ),
            Err(e) => tracing::error!(migration_id = %id, error = %e, "Migration completion failed"),
        }
    }

    // -----------------------------------------------------------------------
    // Evaluations
    // -----------------------------------------------------------------------

    /// Move a QUEUED evaluation to RUNNING and schedule its completion.
    ///
    /// Fails with `NotFound` for an unknown id and `InvalidTransition` if the
    /// evaluation is not QUEUED.
    pub async fn run_evaluation(&self, id: JobId) -> Result<TaskHandle, CoreError> {
        let started = self
            .evaluations
            .update(
                id,
                Box::new(move |e: &mut Evaluation| {
                    validate_transition(EVALUATION_ENTITY, id, e.status, EvaluationStatus::Running)?;
                    e.status = EvaluationStatus::Running;
                    Ok(())
                }),
            )
            .await
            .inspect_err(|e| log_rejected(JobKind::Evaluation, id, e))?;

        tracing::info!(
            evaluation_id = %id,
            models = started.models.len(),
            delay_ms = self.completion_delay.as_millis() as u64,
            "Evaluation started",
        );

        let this = self.clone();
        let task = async move { this.complete_evaluation(id).await }.boxed();
        Ok(self.scheduler.schedule(self.completion_delay, task))
    }

    async fn complete_evaluation(&self, id: JobId) {
        let failure = self.failures.check(JobKind::Evaluation, id);
        let sampler = Arc::clone(&self.sampler);

        let result = self
            .evaluations
            .update(
                id,
                Box::new(move |e: &mut Evaluation| {
                    if let Some(reason) = failure {
                        validate_transition(EVALUATION_ENTITY, id, e.status, EvaluationStatus::Error)?;
                        e.status = EvaluationStatus::Error;
                        e.error_message = Some(reason);
                        return Ok(());
                    }

                    validate_transition(EVALUATION_ENTITY, id, e.status, EvaluationStatus::Done)?;
                    let results: Vec<EvaluationResult> = e
                        .models
                        .iter()
                        .map(|model| EvaluationResult {
                            model: model.clone(),
                            scores: score(&e.weights, sampler.as_ref()),
                        })
                        .collect();
                    e.results = Some(results);
                    e.status = EvaluationStatus::Done;
                    Ok(())
                }),
            )
            .await;

        match result {
            Ok(e) if e.status == EvaluationStatus::Error => tracing::warn!(
                evaluation_id = %id,
                reason = e.error_message.as_deref().unwrap_or_default(),
                "Evaluation failed",
            ),
            Ok(e) => tracing::info!(
                evaluation_id = %id,
                best_model = e.best_result().map(|r| r.model.as_str()).unwrap_or("tie"),
                "Evaluation completed",
            ),
            Err(err) => {
                tracing::error!(evaluation_id = %id, error = %err, "Evaluation completion failed")
            }
        }
    }
}

fn log_rejected(kind: JobKind, id: JobId, error: &CoreError) {
    if let CoreError::InvalidTransition { from, .. } = error {
        tracing::warn!(%kind, job_id = %id, from = *from, "Lifecycle trigger rejected");
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use promptdash_core::migration::NewMigration;
    use promptdash_db::{JobRepository, MemoryRepository};

    use super::*;
    use crate::scheduler::ManualScheduler;

    struct Fixture {
        migrations: Arc<MemoryRepository<Migration>>,
        scheduler: Arc<ManualScheduler>,
        controller: LifecycleController,
    }

    fn fixture() -> Fixture {
        let migrations = Arc::new(MemoryRepository::<Migration>::new());
        let evaluations = Arc::new(MemoryRepository::<Evaluation>::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let controller = LifecycleController::new(
            migrations.clone(),
            evaluations,
            scheduler.clone(),
        );
        Fixture {
            migrations,
            scheduler,
            controller,
        }
    }

    async fn draft(repo: &MemoryRepository<Migration>) -> JobId {
        let input = NewMigration {
            name: "M1".into(),
            source_model: "X".into(),
            target_model: "Y".into(),
            prompts: vec!["hello".into(), "world".into()],
            notes: None,
        };
        repo.create(Migration::draft(input, Utc::now())).await.unwrap().id
    }

    #[tokio::test]
    async fn start_schedules_completion_with_default_delay() {
        let f = fixture();
        let id = draft(&f.migrations).await;

        f.controller.start_migration(id).await.unwrap();

        assert_eq!(f.scheduler.delays(), [DEFAULT_COMPLETION_DELAY]);
        let running = f.migrations.find(id).await.unwrap();
        assert_eq!(running.status, MigrationStatus::Running);
        assert!(running.prompts.iter().all(|p| p.migrated.is_none()));
    }

    #[tokio::test]
    async fn completion_rewrites_every_prompt() {
        let f = fixture();
        let id = draft(&f.migrations).await;

        let handle = f.controller.start_migration(id).await.unwrap();
        assert_eq!(f.scheduler.run_pending().await, 1);
        assert!(handle.wait().await);

        let done = f.migrations.find(id).await.unwrap();
        assert_eq!(done.status, MigrationStatus::Completed);
        let migrated: Vec<_> = done
            .prompts
            .iter()
            .map(|p| p.migrated.as_deref().unwrap())
            .collect();
        assert_eq!(migrated, ["hello (migrated to Y)", "world (migrated to Y)"]);
    }

    #[tokio::test]
    async fn second_start_is_rejected_without_scheduling() {
        let f = fixture();
        let id = draft(&f.migrations).await;

        f.controller.start_migration(id).await.unwrap();
        let second = f.controller.start_migration(id).await;

        assert_matches!(
            second,
            Err(CoreError::InvalidTransition { from: "RUNNING", to: "RUNNING", .. })
        );
        assert_eq!(f.scheduler.pending(), 1);
    }

    #[tokio::test]
    async fn start_unknown_migration_is_not_found() {
        let f = fixture();
        assert_matches!(
            f.controller.start_migration(JobId::new_v4()).await,
            Err(CoreError::NotFound { entity: "Migration", .. })
        );
    }

    #[tokio::test]
    async fn custom_delay_is_passed_to_the_scheduler() {
        let f = fixture();
        let controller = f
            .controller
            .clone()
            .with_completion_delay(Duration::from_millis(5));
        let id = draft(&f.migrations).await;

        controller.start_migration(id).await.unwrap();
        assert_eq!(f.scheduler.delays(), [Duration::from_millis(5)]);
    }
}
