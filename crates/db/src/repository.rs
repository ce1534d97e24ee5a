//! Repository trait for job records.

use async_trait::async_trait;
use promptdash_core::error::CoreError;
use promptdash_core::evaluation::{Evaluation, EVALUATION_ENTITY};
use promptdash_core::migration::{Migration, MIGRATION_ENTITY};
use promptdash_core::types::JobId;

/// A record owned by a [`JobRepository`].
pub trait JobRecord: Clone + Send + Sync + 'static {
    /// Entity name used in `NotFound` errors and logs.
    const ENTITY: &'static str;

    fn id(&self) -> JobId;

    /// Called by the repository when the record is first stored.
    fn assign_id(&mut self, id: JobId);
}

impl JobRecord for Migration {
    const ENTITY: &'static str = MIGRATION_ENTITY;

    fn id(&self) -> JobId {
        self.id
    }

    fn assign_id(&mut self, id: JobId) {
        self.id = id;
    }
}

impl JobRecord for Evaluation {
    const ENTITY: &'static str = EVALUATION_ENTITY;

    fn id(&self) -> JobId {
        self.id
    }

    fn assign_id(&mut self, id: JobId) {
        self.id = id;
    }
}

/// An in-place change to one record.
///
/// The mutation receives a draft copy. Returning `Err` discards the draft;
/// returning `Ok` replaces the stored record with the draft in one step.
pub type Mutation<T> = Box<dyn FnOnce(&mut T) -> Result<(), CoreError> + Send>;

/// Storage for one kind of job record.
///
/// Guarantees:
/// - `create` assigns a fresh unique id and makes the record the first one
///   returned by `list` (newest first).
/// - `get` and `list` return snapshots; a snapshot never reflects a partially
///   applied mutation.
/// - `update` is atomic per record: concurrent updates of the same id are
///   serialized, and each sees the result of the previous one.
#[async_trait]
pub trait JobRepository<T: JobRecord>: Send + Sync {
    /// Store a new record and return it with its assigned id.
    async fn create(&self, record: T) -> Result<T, CoreError>;

    /// Snapshot of one record, or `None` if the id is unknown.
    async fn get(&self, id: JobId) -> Result<Option<T>, CoreError>;

    /// Snapshots of all records, newest first.
    async fn list(&self) -> Result<Vec<T>, CoreError>;

    /// Apply `mutation` atomically and return the committed snapshot.
    ///
    /// Returns [`CoreError::NotFound`] if the id is unknown, or the
    /// mutation's own error (nothing is written in that case).
    async fn update(&self, id: JobId, mutation: Mutation<T>) -> Result<T, CoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, CoreError>;

    /// Like [`get`](Self::get) but maps a missing record to
    /// [`CoreError::NotFound`].
    async fn find(&self, id: JobId) -> Result<T, CoreError> {
        self.get(id).await?.ok_or(CoreError::NotFound {
            entity: T::ENTITY,
            id,
        })
    }
}
