//! Failure injection for job completion.
//!
//! Simulated jobs always succeed unless a [`FailurePolicy`] says otherwise.
//! A policy returning a reason routes the job to its failure state
//! (`FAILED` for migrations, `ERROR` for evaluations).

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use promptdash_core::types::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Migration,
    Evaluation,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Migration => write!(f, "migration"),
            JobKind::Evaluation => write!(f, "evaluation"),
        }
    }
}

/// Decides at completion time whether a job fails.
pub trait FailurePolicy: Send + Sync {
    /// `Some(reason)` fails the job; `None` lets it complete.
    fn check(&self, kind: JobKind, id: JobId) -> Option<String>;
}

/// Every job completes successfully.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverFail;

impl FailurePolicy for NeverFail {
    fn check(&self, _kind: JobKind, _id: JobId) -> Option<String> {
        None
    }
}

/// Fails the listed job ids with a fixed reason.
#[derive(Debug)]
pub struct FailSelected {
    ids: Mutex<HashSet<JobId>>,
    reason: String,
}

impl FailSelected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            ids: Mutex::new(HashSet::new()),
            reason: reason.into(),
        }
    }

    /// Mark `id` to fail when its completion fires.
    pub fn fail(&self, id: JobId) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }
}

impl FailurePolicy for FailSelected {
    fn check(&self, _kind: JobKind, id: JobId) -> Option<String> {
        let ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        ids.contains(&id).then(|| self.reason.clone())
    }
}
