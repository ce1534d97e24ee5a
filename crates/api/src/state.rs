use std::sync::Arc;

use promptdash_core::scoring::SeededSampler;
use promptdash_worker::{JobService, Scheduler};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the service and config are shared.
#[derive(Clone)]
pub struct AppState {
    /// Job operations over the in-memory store.
    pub service: JobService,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the in-memory service from configuration. `SCORING_SEED`
    /// selects a seeded sampler; otherwise scores are random.
    pub fn new(config: ServerConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let delay = config.completion_delay;
        let seed = config.scoring_seed;

        let service = JobService::in_memory(scheduler, |lifecycle| {
            let lifecycle = lifecycle.with_completion_delay(delay);
            match seed {
                Some(seed) => lifecycle.with_sampler(Arc::new(SeededSampler::new(seed))),
                None => lifecycle,
            }
        });

        Self {
            service,
            config: Arc::new(config),
        }
    }
}
