pub mod evaluations;
pub mod migrations;

use promptdash_core::error::CoreError;
use promptdash_core::types::JobId;

use crate::error::AppError;

/// Parse a path id. Anything that is not a UUID cannot name a stored job,
/// so it is reported as not found.
pub(crate) fn parse_id(entity: &'static str, raw: &str) -> Result<JobId, AppError> {
    JobId::parse_str(raw).map_err(|_| {
        tracing::debug!(entity, id = raw, "Malformed job id");
        AppError::Core(CoreError::NotFound {
            entity,
            id: JobId::nil(),
        })
    })
}
