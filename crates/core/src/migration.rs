//! Prompt migration records and creation input.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::query::{ListQuery, Queryable, SortOrder, SortValue, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::status::MigrationStatus;
use crate::types::{timestamp_text, JobId, Timestamp};
use crate::validation::not_blank;

/// Entity name used in errors and logs.
pub const MIGRATION_ENTITY: &str = "Migration";

/// One prompt inside a migration. `migrated` is filled on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPrompt {
    pub id: JobId,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated: Option<String>,
}

impl MigrationPrompt {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: JobId::new_v4(),
            source: source.into(),
            migrated: None,
        }
    }
}

/// A job rewriting a set of source prompts for a new target model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Migration {
    pub id: JobId,
    pub name: String,
    pub source_model: String,
    pub target_model: String,
    pub status: MigrationStatus,
    pub created_at: Timestamp,
    pub prompts: Vec<MigrationPrompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Migration {
    /// Build a DRAFT migration from validated input. The id is a placeholder
    /// until the store assigns one.
    pub fn draft(input: NewMigration, created_at: Timestamp) -> Self {
        Self {
            id: JobId::nil(),
            name: input.name,
            source_model: input.source_model,
            target_model: input.target_model,
            status: MigrationStatus::Draft,
            created_at,
            prompts: input.prompts.into_iter().map(MigrationPrompt::new).collect(),
            error_message: None,
        }
    }

    /// Rewritten text for one source prompt.
    pub fn migrated_text(&self, source: &str) -> String {
        format!("{source} (migrated to {})", self.target_model)
    }
}

/// Input for creating a migration.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "models_differ"))]
pub struct NewMigration {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub source_model: String,
    #[validate(custom(function = "not_blank"))]
    pub target_model: String,
    pub prompts: Vec<String>,
    /// Free-form notes from the creation form. Accepted but not stored.
    pub notes: Option<String>,
}

fn models_differ(input: &NewMigration) -> Result<(), ValidationError> {
    if !input.source_model.is_empty() && input.source_model == input.target_model {
        return Err(ValidationError::new("same_model")
            .with_message("source and target models must be different".into()));
    }
    Ok(())
}

/// Default sort key for migration listings.
pub const DEFAULT_MIGRATION_SORT: &str = "createdAt";

/// Query parameters for listing migrations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    /// Sort key, defaults to `createdAt`.
    pub sort: Option<String>,
    /// `asc` or `desc` (default).
    pub order: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl MigrationListParams {
    /// Resolve defaults into a [`ListQuery`]. Migrations are always sorted,
    /// newest first unless the caller says otherwise.
    pub fn to_query(&self) -> ListQuery {
        let key = self
            .sort
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_MIGRATION_SORT);
        let order = self
            .order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();

        ListQuery {
            search: self.search.clone(),
            status: self.status.clone(),
            model: None,
            sort: None,
            page: self.page.unwrap_or(DEFAULT_PAGE),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
        .with_sort(key, order)
    }
}

impl Queryable for Migration {
    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }

    fn status_text(&self) -> &str {
        self.status.as_str()
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            "sourceModel" => Some(self.source_model.clone()),
            "targetModel" => Some(self.target_model.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "createdAt" => Some(timestamp_text(&self.created_at)),
            _ => None,
        }
    }
}
