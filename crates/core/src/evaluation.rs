//! Prompt evaluation records and creation input.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::query::{ListQuery, Queryable, SortValue, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::scoring::{RubricWeights, ScoreCard};
use crate::status::EvaluationStatus;
use crate::types::{timestamp_text, JobId, Timestamp};
use crate::validation::{not_blank, rubric_weights};

/// Entity name used in errors and logs.
pub const EVALUATION_ENTITY: &str = "Evaluation";

/// Score card for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub model: String,
    #[serde(flatten)]
    pub scores: ScoreCard,
}

/// A job scoring one prompt across several models with a weighted rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: JobId,
    pub name: String,
    pub prompt: String,
    pub models: Vec<String>,
    pub weights: RubricWeights,
    pub status: EvaluationStatus,
    pub created_at: Timestamp,
    /// Present only once the evaluation is DONE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<EvaluationResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Evaluation {
    /// Build a QUEUED evaluation from validated input. The id is a
    /// placeholder until the store assigns one; validated input always
    /// carries weights.
    pub fn queued(input: NewEvaluation, created_at: Timestamp) -> Self {
        Self {
            id: JobId::nil(),
            name: input.name,
            prompt: input.prompt,
            models: input.models,
            weights: input.weights.unwrap_or_else(RubricWeights::uniform),
            status: EvaluationStatus::Queued,
            created_at,
            results: None,
            error_message: None,
        }
    }

    /// The result with the highest overall score, or `None` when there are
    /// no results or the top score is shared.
    pub fn best_result(&self) -> Option<&EvaluationResult> {
        let results = self.results.as_ref()?;
        let top = results.iter().map(|r| r.scores.overall).max()?;
        let mut leaders = results.iter().filter(|r| r.scores.overall == top);
        let best = leaders.next()?;
        match leaders.next() {
            Some(_) => None,
            None => Some(best),
        }
    }
}

/// Input for creating an evaluation.
///
/// Requires at least one model; the two-distinct-models rule of the
/// creation form is enforced by the HTTP layer.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEvaluation {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub prompt: String,
    #[validate(length(min = 1, message = "at least one model is required"))]
    pub models: Vec<String>,
    #[validate(
        required(message = "weights are required"),
        custom(function = "rubric_weights")
    )]
    pub weights: Option<RubricWeights>,
}

/// Query parameters for listing evaluations. No sort is applied, so
/// results come back in store order (newest first).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub model: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl EvaluationListParams {
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            search: self.search.clone(),
            status: self.status.clone(),
            model: self.model.clone(),
            sort: None,
            page: self.page.unwrap_or(DEFAULT_PAGE),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

impl Queryable for Evaluation {
    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.prompt.to_lowercase().contains(needle)
    }

    fn status_text(&self) -> &str {
        self.status.as_str()
    }

    fn matches_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            "prompt" => Some(self.prompt.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "createdAt" => Some(timestamp_text(&self.created_at)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;
    use crate::error::CoreError;
    use crate::validation::validate_input;

    fn input(models: &[&str]) -> NewEvaluation {
        NewEvaluation {
            name: "Tone check".into(),
            prompt: "Summarize the ticket".into(),
            models: models.iter().map(|m| m.to_string()).collect(),
            weights: Some(RubricWeights::uniform()),
        }
    }

    fn result(model: &str, overall: u8) -> EvaluationResult {
        EvaluationResult {
            model: model.into(),
            scores: ScoreCard {
                clarity: overall,
                specificity: overall,
                safety: overall,
                overall,
            },
        }
    }

    #[test]
    fn empty_model_list_is_invalid() {
        let err = validate_input(&input(&[])).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("at least one model"));
    }

    #[test]
    fn zero_weights_are_invalid() {
        let mut bad = input(&["A", "B"]);
        bad.weights = Some(RubricWeights::new(0.0, 0.0, 0.0));
        assert_matches!(validate_input(&bad), Err(CoreError::Validation(_)));
    }

    #[test]
    fn missing_weights_are_a_validation_error() {
        let parsed: NewEvaluation =
            serde_json::from_str(r#"{"name":"n","prompt":"p","models":["A","B"]}"#).unwrap();
        let err = validate_input(&parsed).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("weights are required"));
    }

    #[test]
    fn queued_evaluation_has_no_results() {
        let evaluation = Evaluation::queued(input(&["A", "B"]), Utc::now());
        assert_eq!(evaluation.status, EvaluationStatus::Queued);
        assert!(evaluation.results.is_none());
        let json = serde_json::to_value(&evaluation).unwrap();
        assert!(json.get("results").is_none());
        assert_eq!(json["weights"]["clarity"], 1.0);
    }

    #[test]
    fn result_scores_are_flattened() {
        let json = serde_json::to_value(result("A", 77)).unwrap();
        assert_eq!(json["model"], "A");
        assert_eq!(json["overall"], 77);
        assert_eq!(json["clarity"], 77);
    }

    #[test]
    fn best_result_requires_a_unique_leader() {
        let mut evaluation = Evaluation::queued(input(&["A", "B"]), Utc::now());
        assert!(evaluation.best_result().is_none());

        evaluation.results = Some(vec![result("A", 70), result("B", 88)]);
        assert_eq!(evaluation.best_result().map(|r| r.model.as_str()), Some("B"));

        evaluation.results = Some(vec![result("A", 88), result("B", 88)]);
        assert!(evaluation.best_result().is_none());
    }

    #[test]
    fn search_matches_name_or_prompt() {
        let evaluation = Evaluation::queued(input(&["A", "B"]), Utc::now());
        assert!(evaluation.matches_search("tone"));
        assert!(evaluation.matches_search("ticket"));
        assert!(!evaluation.matches_search("invoice"));
        assert!(evaluation.matches_model("B"));
        assert!(!evaluation.matches_model("b"));
    }
}
