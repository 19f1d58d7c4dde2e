//! Answer document validation at the submission boundary.
//!
//! Validation runs in two phases:
//!
//! 1. **Structural** — the raw JSON is validated against the embedded
//!    answers schema using the `jsonschema` crate, then deserialized into
//!    the typed `ExamAnswers`.
//! 2. **Semantic** — cross-field rules the schema language cannot express:
//!    the declared case count must equal the number of cases, and the
//!    aspect weights of each case must sum to exactly 100.
//!
//! All failures of a phase are collected before returning, so the form
//! layer can show the full failure set in one pass. The core only ever
//! sees the validated `ExamAnswers` shape — raw caller JSON stops here.

use serde_json::json;
use tracing::debug;

use examlink_contracts::{
    error::{ExamLinkError, ExamLinkResult},
    submission::ExamAnswers,
};

/// The structural schema for an answers document.
///
/// Bounds mirror the exam form: duration 1–120 minutes, 1–3 cases with at
/// most 10 weighted aspects each, at most 20 guide topics.
fn answers_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["modality", "duration_min", "declared_case_count", "cases"],
        "additionalProperties": false,
        "properties": {
            "modality": { "type": "string", "minLength": 1 },
            "duration_min": { "type": "integer", "minimum": 1, "maximum": 120 },
            "guide_topics": {
                "type": "array",
                "maxItems": 20,
                "items": { "type": "string", "minLength": 1 }
            },
            "declared_case_count": { "type": "integer", "minimum": 1, "maximum": 3 },
            "cases": {
                "type": "array",
                "minItems": 1,
                "maxItems": 3,
                "items": {
                    "type": "object",
                    "required": ["name", "aspects"],
                    "additionalProperties": false,
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "aspects": {
                            "type": "array",
                            "minItems": 1,
                            "maxItems": 10,
                            "items": {
                                "type": "object",
                                "required": ["name", "weight"],
                                "additionalProperties": false,
                                "properties": {
                                    "name": { "type": "string", "minLength": 1 },
                                    "weight": {
                                        "type": "integer",
                                        "minimum": 0,
                                        "maximum": 100
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Validate a raw answers document and produce the typed shape.
///
/// Returns `ValidationFailed` carrying every violation found in the
/// failing phase, joined into one message.
pub fn validate_answers(raw: &serde_json::Value) -> ExamLinkResult<ExamAnswers> {
    // ── Phase 1: structural ───────────────────────────────────────────────
    let schema = answers_schema();
    let validator = jsonschema::validator_for(&schema).map_err(|e| ExamLinkError::Internal {
        reason: format!("answers schema failed to compile: {}", e),
    })?;

    let structural: Vec<String> = validator
        .iter_errors(raw)
        .map(|error| format!("at {}: {}", error.instance_path, error))
        .collect();
    if !structural.is_empty() {
        debug!(failures = structural.len(), "answers failed structural validation");
        return Err(ExamLinkError::ValidationFailed {
            reason: structural.join("; "),
        });
    }

    let answers: ExamAnswers =
        serde_json::from_value(raw.clone()).map_err(|e| ExamLinkError::ValidationFailed {
            reason: format!("answers do not deserialize: {}", e),
        })?;

    // ── Phase 2: semantic ─────────────────────────────────────────────────
    let mut semantic: Vec<String> = Vec::new();

    if answers.declared_case_count as usize != answers.cases.len() {
        semantic.push(format!(
            "declared_case_count is {} but {} cases were supplied",
            answers.declared_case_count,
            answers.cases.len()
        ));
    }

    for (index, case) in answers.cases.iter().enumerate() {
        let sum: u32 = case.aspects.iter().map(|a| a.weight).sum();
        if sum != 100 {
            semantic.push(format!(
                "aspect weights of case {} sum to {}, expected 100",
                index + 1,
                sum
            ));
        }
    }

    if !semantic.is_empty() {
        debug!(failures = semantic.len(), "answers failed semantic validation");
        return Err(ExamLinkError::ValidationFailed {
            reason: semantic.join("; "),
        });
    }

    Ok(answers)
}

// ── Tests ────────────────────────────────────────────────────────────────────
