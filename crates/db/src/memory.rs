//! In-memory [`JobRepository`] backend.
//!
//! Records live for the lifetime of the process. The index (id map plus
//! insertion order) sits behind one `RwLock`; every record has its own
//! `Mutex`, so writers of one job never block readers or writers of another.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use promptdash_core::error::CoreError;
use promptdash_core::types::JobId;
use tokio::sync::{Mutex, RwLock};

use crate::repository::{JobRecord, JobRepository, Mutation};

struct Index<T> {
    records: HashMap<JobId, Arc<Mutex<T>>>,
    /// Ids in insertion order, oldest first.
    order: Vec<JobId>,
}

/// Process-lifetime repository backed by a `HashMap<JobId, Mutex<T>>`.
pub struct MemoryRepository<T> {
    index: RwLock<Index<T>>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            index: RwLock::new(Index {
                records: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }
}

impl<T: JobRecord> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: JobId) -> Option<Arc<Mutex<T>>> {
        self.index.read().await.records.get(&id).cloned()
    }
}

#[async_trait]
impl<T: JobRecord> JobRepository<T> for MemoryRepository<T> {
    async fn create(&self, mut record: T) -> Result<T, CoreError> {
        let mut index = self.index.write().await;

        let mut id = JobId::new_v4();
        while index.records.contains_key(&id) {
            id = JobId::new_v4();
        }
        record.assign_id(id);

        index
            .records
            .insert(id, Arc::new(Mutex::new(record.clone())));
        index.order.push(id);

        tracing::debug!(entity = T::ENTITY, id = %id, "Record stored");
        Ok(record)
    }

    async fn get(&self, id: JobId) -> Result<Option<T>, CoreError> {
        match self.slot(id).await {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<T>, CoreError> {
        let slots: Vec<Arc<Mutex<T>>> = {
            let index = self.index.read().await;
            index
                .order
                .iter()
                .rev()
                .filter_map(|id| index.records.get(id).cloned())
                .collect()
        };

        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            out.push(slot.lock().await.clone());
        }
        Ok(out)
    }

    async fn update(&self, id: JobId, mutation: Mutation<T>) -> Result<T, CoreError> {
        let slot = self.slot(id).await.ok_or(CoreError::NotFound {
            entity: T::ENTITY,
            id,
        })?;

        let mut current = slot.lock().await;
        let mut draft = current.clone();
        mutation(&mut draft)?;
        *current = draft;
        Ok(current.clone())
    }

    async fn count(&self) -> Result<usize, CoreError> {
        Ok(self.index.read().await.order.len())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use promptdash_core::migration::{Migration, NewMigration};
    use promptdash_core::status::MigrationStatus;

    use super::*;

    fn draft(name: &str) -> Migration {
        Migration::draft(
            NewMigration {
                name: name.into(),
                source_model: "X".into(),
                target_model: "Y".into(),
                prompts: vec!["hello".into()],
                notes: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let repo: MemoryRepository<Migration> = MemoryRepository::new();
        let a = repo.create(draft("a")).await.unwrap();
        let b = repo.create(draft("b")).await.unwrap();

        assert!(!a.id.is_nil());
        assert_ne!(a.id, b.id);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let repo: MemoryRepository<Migration> = MemoryRepository::new();
        for name in ["first", "second", "third"] {
            repo.create(draft(name)).await.unwrap();
        }

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let repo: MemoryRepository<Migration> = MemoryRepository::new();
        assert!(repo.get(JobId::new_v4()).await.unwrap().is_none());
        assert_matches!(
            repo.find(JobId::new_v4()).await,
            Err(CoreError::NotFound { entity: "Migration", .. })
        );
    }

    #[tokio::test]
    async fn update_commits_the_draft() {
        let repo: MemoryRepository<Migration> = MemoryRepository::new();
        let created = repo.create(draft("m")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                Box::new(|m: &mut Migration| {
                    m.status = MigrationStatus::Running;
                    Ok(())
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, MigrationStatus::Running);
        let stored = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MigrationStatus::Running);
    }

    #[tokio::test]
    async fn failed_update_writes_nothing() {
        let repo: MemoryRepository<Migration> = MemoryRepository::new();
        let created = repo.create(draft("m")).await.unwrap();

        let result = repo
            .update(
                created.id,
                Box::new(|m: &mut Migration| {
                    m.name = "changed".into();
                    Err(CoreError::Validation("nope".into()))
                }),
            )
            .await;

        assert_matches!(result, Err(CoreError::Validation(_)));
        let stored = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "m");
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let repo: MemoryRepository<Migration> = MemoryRepository::new();
        let result = repo
            .update(JobId::new_v4(), Box::new(|_: &mut Migration| Ok(())))
            .await;
        assert_matches!(result, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn snapshots_do_not_alias_stored_records() {
        let repo: MemoryRepository<Migration> = MemoryRepository::new();
        let created = repo.create(draft("m")).await.unwrap();

        let mut snapshot = repo.get(created.id).await.unwrap().unwrap();
        snapshot.name = "local edit".into();

        let stored = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "m");
    }
}
