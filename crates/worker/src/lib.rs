//! Job lifecycle execution.
//!
//! - [`scheduler`]: deferred task execution (tokio-backed and manual).
//! - [`failure`]: failure injection consulted at completion time.
//! - [`lifecycle`]: the state-machine driver for migrations and evaluations.
//! - [`service`]: create/list/get/trigger operations used by the API.

pub mod failure;
pub mod lifecycle;
pub mod scheduler;
pub mod service;

pub use lifecycle::{LifecycleController, DEFAULT_COMPLETION_DELAY};
pub use scheduler::{ManualScheduler, Scheduler, TaskHandle, TokioScheduler};
pub use service::JobService;
