//! Shapes parsed provider output into typed results.
//!
//! Unexpected shapes are tolerated. A missing field becomes an empty list or
//! "", a lone item where a list is expected becomes a one-item list, and a
//! wrongly typed field inside an item falls back to its default instead of
//! dropping the item. Nothing here fails a request.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::{
    catalog::model_for_specialty,
    models::{
        ClarifyingQuestions, CmeTopicSuggestions, Diagnosis, DrugInteractions, FinalReport,
        InitialDiagnoses, SpecialistRecommendations, SpecialtyRecommendation,
    },
};

pub const MAX_QUESTIONS: usize = 10;
pub const MIN_RECOMMENDATIONS: usize = 5;
pub const MAX_RECOMMENDATIONS: usize = 6;

fn list<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match value.get(key) {
        Some(Value::Array(items)) => items,
        other => list_or_warn(other, key),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Items of a pass-through list field. A single object or string stands in
/// for a one-item list.
fn entries<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match value.get(key) {
        Some(Value::Array(items)) => items,
        Some(single @ (Value::Object(_) | Value::String(_))) => std::slice::from_ref(single),
        other => list_or_warn(other, key),
    }
}

fn list_or_warn<'a>(value: Option<&'a Value>, key: &str) -> &'a [Value] {
    if let Some(other) = value.filter(|v| !v.is_null()) {
        warn!(field = key, found = %json_kind(other), "Expected a list in AI response");
    }
    &[]
}

fn typed_list<T: DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
    entries(value, key)
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(field = key, error = %e, "Skipping malformed item in AI response");
                None
            }
        })
        .collect()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    entries(value, key)
        .iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect()
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn check_diagnoses(diagnoses: &[Diagnosis]) {
    for diagnosis in diagnoses.iter().filter(|d| !d.probability_in_range()) {
        warn!(
            diagnosis = %diagnosis.name,
            probability = diagnosis.probability,
            "Diagnosis probability outside [0, 1]"
        );
    }
}

/// At most [`MAX_QUESTIONS`] non-blank questions. Accepts either
/// `{"questions": [...]}` or a bare list.
pub fn clarifying_questions(value: &Value) -> ClarifyingQuestions {
    let items: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        other => list(other, "questions"),
    };
    let questions = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .take(MAX_QUESTIONS)
        .map(str::to_string)
        .collect();
    ClarifyingQuestions { questions }
}

/// Annotates every recommendation with the model assigned to its specialty.
pub fn specialist_recommendations(value: &Value) -> SpecialistRecommendations {
    let recommendations: Vec<SpecialtyRecommendation> = list(value, "recommendations")
        .iter()
        .filter(|item| item.is_object())
        .map(|item| {
            let specialty = string_field(item, "specialty");
            let model = model_for_specialty(&specialty).to_string();
            SpecialtyRecommendation {
                reason: string_field(item, "reason"),
                specialty,
                model,
            }
        })
        .collect();

    if !(MIN_RECOMMENDATIONS..=MAX_RECOMMENDATIONS).contains(&recommendations.len()) {
        warn!(
            count = recommendations.len(),
            "Specialist recommendation count outside the requested 5-6"
        );
    }
    SpecialistRecommendations { recommendations }
}

pub fn initial_diagnoses(value: &Value) -> InitialDiagnoses {
    let diagnoses: Vec<Diagnosis> = typed_list(value, "diagnoses");
    check_diagnoses(&diagnoses);
    InitialDiagnoses { diagnoses }
}

pub fn final_report(value: &Value) -> FinalReport {
    let report = FinalReport {
        consensus_diagnosis: typed_list(value, "consensusDiagnosis"),
        rejected_hypotheses: typed_list(value, "rejectedHypotheses"),
        recommended_tests: string_list(value, "recommendedTests"),
        treatment_plan: string_list(value, "treatmentPlan"),
        medication_recommendations: typed_list(value, "medicationRecommendations"),
        unexpected_findings: string_field(value, "unexpectedFindings"),
    };
    check_diagnoses(&report.consensus_diagnosis);
    report
}

pub fn drug_interactions(value: &Value) -> DrugInteractions {
    DrugInteractions {
        interactions: typed_list(value, "interactions"),
    }
}

pub fn cme_topics(value: &Value) -> CmeTopicSuggestions {
    CmeTopicSuggestions {
        topics: typed_list(value, "topics"),
    }
}
