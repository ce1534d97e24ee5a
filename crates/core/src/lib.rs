//! Domain types for the prompt job dashboard.
//!
//! This crate has no runtime dependencies: it holds the job records, their
//! lifecycle state machines, rubric scoring and the list query engine, so it
//! can be shared by the store, the lifecycle worker and the HTTP layer.

pub mod error;
pub mod evaluation;
pub mod migration;
pub mod query;
pub mod scoring;
pub mod status;
pub mod types;
pub mod validation;
