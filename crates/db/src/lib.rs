//! Job storage.
//!
//! [`JobRepository`] is the storage seam used by the lifecycle worker and the
//! job service. [`MemoryRepository`] is the process-lifetime backend.

pub mod memory;
pub mod repository;

pub use memory::MemoryRepository;
pub use repository::{JobRecord, JobRepository, Mutation};

/// Repository over prompt migrations.
pub type MigrationRepo = dyn JobRepository<promptdash_core::migration::Migration>;

/// Repository over prompt evaluations.
pub type EvaluationRepo = dyn JobRepository<promptdash_core::evaluation::Evaluation>;
