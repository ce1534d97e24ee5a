//! Helpers bridging `validator` derive output into [`CoreError`].

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;
use crate::scoring::RubricWeights;

/// Run `validator` checks on `input`, mapping failures to
/// [`CoreError::Validation`].
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(describe(&errors)))
}

/// Flatten validation errors into one stable, human-readable message.
///
/// Fields are listed alphabetically; struct-level errors come last.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter()
                .map(move |e| (field.clone(), message_for(e)))
                .collect::<Vec<_>>()
        })
        .collect();
    fields.sort_by(|a, b| {
        let a_schema = a.0 == "__all__";
        let b_schema = b.0 == "__all__";
        a_schema.cmp(&b_schema).then_with(|| a.0.cmp(&b.0))
    });

    fields
        .into_iter()
        .map(|(field, msg)| {
            if field == "__all__" {
                msg
            } else {
                format!("{field}: {msg}")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn message_for(error: &ValidationError) -> String {
    match &error.message {
        Some(msg) => msg.to_string(),
        None => error.code.to_string(),
    }
}

/// Reject blank (empty or whitespace-only) strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Rubric weights must be finite, non-negative and sum to more than zero.
pub fn rubric_weights(weights: &RubricWeights) -> Result<(), ValidationError> {
    let values = [weights.clarity, weights.specificity, weights.safety];
    if values.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ValidationError::new("weights")
            .with_message("weights must be finite, non-negative numbers".into()));
    }
    if weights.total() <= 0.0 {
        return Err(ValidationError::new("weights")
            .with_message("at least one weight must be greater than zero".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("gpt").is_ok());
    }

    #[test]
    fn negative_or_zero_sum_weights_are_rejected() {
        assert!(rubric_weights(&RubricWeights::new(-1.0, 1.0, 1.0)).is_err());
        assert!(rubric_weights(&RubricWeights::new(0.0, 0.0, 0.0)).is_err());
        assert!(rubric_weights(&RubricWeights::new(f64::NAN, 1.0, 1.0)).is_err());
        assert!(rubric_weights(&RubricWeights::new(0.0, 0.0, 2.5)).is_ok());
    }
}
