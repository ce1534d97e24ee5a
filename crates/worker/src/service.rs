//! Job service: the operations exposed to the HTTP layer.
//!
//! Creation validates input and stores a new job in its initial state.
//! Reads go straight to the repositories. Triggers are delegated to the
//! [`LifecycleController`].

use std::sync::Arc;

use chrono::Utc;
use promptdash_core::error::CoreError;
use promptdash_core::evaluation::{Evaluation, EvaluationListParams, NewEvaluation};
use promptdash_core::migration::{Migration, MigrationListParams, NewMigration};
use promptdash_core::query::{query, Page};
use promptdash_core::types::JobId;
use promptdash_core::validation::validate_input;
use promptdash_db::{EvaluationRepo, MemoryRepository, MigrationRepo};
use serde::Serialize;

use crate::lifecycle::LifecycleController;
use crate::scheduler::Scheduler;

/// Acknowledgement returned by a successful migration start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StartAck {
    pub success: bool,
}

/// Acknowledgement returned by a successful evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunAck {
    pub ok: bool,
}

/// Record counts, used by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub migrations: usize,
    pub evaluations: usize,
}

#[derive(Clone)]
pub struct JobService {
    migrations: Arc<MigrationRepo>,
    evaluations: Arc<EvaluationRepo>,
    lifecycle: LifecycleController,
}

impl JobService {
    pub fn new(
        migrations: Arc<MigrationRepo>,
        evaluations: Arc<EvaluationRepo>,
        lifecycle: LifecycleController,
    ) -> Self {
        Self {
            migrations,
            evaluations,
            lifecycle,
        }
    }

    /// Service over fresh in-memory repositories. `configure` adjusts the
    /// lifecycle controller (sampler, failure policy, delay).
    pub fn in_memory(
        scheduler: Arc<dyn Scheduler>,
        configure: impl FnOnce(LifecycleController) -> LifecycleController,
    ) -> Self {
        let migrations: Arc<MigrationRepo> = Arc::new(MemoryRepository::<Migration>::new());
        let evaluations: Arc<EvaluationRepo> = Arc::new(MemoryRepository::<Evaluation>::new());
        let lifecycle = configure(LifecycleController::new(
            Arc::clone(&migrations),
            Arc::clone(&evaluations),
            scheduler,
        ));
        Self::new(migrations, evaluations, lifecycle)
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub async fn counts(&self) -> Result<JobCounts, CoreError> {
        Ok(JobCounts {
            migrations: self.migrations.count().await?,
            evaluations: self.evaluations.count().await?,
        })
    }

    // -----------------------------------------------------------------------
    // Migrations
    // -----------------------------------------------------------------------

    pub async fn create_migration(&self, input: NewMigration) -> Result<Migration, CoreError> {
        validate_input(&input)?;
        let created = self
            .migrations
            .create(Migration::draft(input, Utc::now()))
            .await?;

        tracing::info!(
            migration_id = %created.id,
            name = %created.name,
            prompts = created.prompts.len(),
            "Migration created",
        );
        Ok(created)
    }

    pub async fn list_migrations(
        &self,
        params: &MigrationListParams,
    ) -> Result<Page<Migration>, CoreError> {
        let records = self.migrations.list().await?;
        Ok(query(records, &params.to_query()))
    }

    pub async fn get_migration(&self, id: JobId) -> Result<Migration, CoreError> {
        self.migrations.find(id).await
    }

    pub async fn start_migration(&self, id: JobId) -> Result<StartAck, CoreError> {
        self.lifecycle.start_migration(id).await?;
        Ok(StartAck { success: true })
    }

    // -----------------------------------------------------------------------
    // Evaluations
    // -----------------------------------------------------------------------

    pub async fn create_evaluation(&self, input: NewEvaluation) -> Result<Evaluation, CoreError> {
        validate_input(&input)?;
        let created = self
            .evaluations
            .create(Evaluation::queued(input, Utc::now()))
            .await?;

        tracing::info!(
            evaluation_id = %created.id,
            name = %created.name,
            models = created.models.len(),
            "Evaluation created",
        );
        Ok(created)
    }

    pub async fn list_evaluations(
        &self,
        params: &EvaluationListParams,
    ) -> Result<Page<Evaluation>, CoreError> {
        let records = self.evaluations.list().await?;
        Ok(query(records, &params.to_query()))
    }

    pub async fn get_evaluation(&self, id: JobId) -> Result<Evaluation, CoreError> {
        self.evaluations.find(id).await
    }

    pub async fn run_evaluation(&self, id: JobId) -> Result<RunAck, CoreError> {
        self.lifecycle.run_evaluation(id).await?;
        Ok(RunAck { ok: true })
    }
}
