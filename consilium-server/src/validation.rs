//! Field checks applied to caller input before anything is stored.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::models::{AnalysisUpdate, CME_TOPIC_MAX_CHARS, NewAnalysis, NewCaseEntry, NewCmeTopic};

pub const PATIENT_ID_MAX_CHARS: usize = 255;
pub const PATIENT_DATA_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const DEBATE_HISTORY_MAX_ENTRIES: usize = 1000;
pub const SEARCH_QUERY_MAX_CHARS: usize = 200;
pub const FINAL_DIAGNOSIS_MAX_CHARS: usize = 500;

static PATIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid regex"));

/// A rejected field and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult = Result<(), FieldError>;

pub fn patient_id(value: &str) -> ValidationResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new("patient_id", "Patient ID cannot be empty"));
    }
    if trimmed.chars().count() > PATIENT_ID_MAX_CHARS {
        return Err(FieldError::new(
            "patient_id",
            format!("Patient ID cannot exceed {PATIENT_ID_MAX_CHARS} characters"),
        ));
    }
    if !PATIENT_ID.is_match(trimmed) {
        return Err(FieldError::new(
            "patient_id",
            "Patient ID can only contain letters, digits, hyphens and underscores",
        ));
    }
    Ok(())
}

pub fn patient_data(value: &Value) -> ValidationResult {
    if !value.is_object() {
        return Err(FieldError::new("patient_data", "Patient data must be an object"));
    }
    let size = serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(usize::MAX);
    if size > PATIENT_DATA_MAX_BYTES {
        return Err(FieldError::new("patient_data", "Patient data is too large (max 5MB)"));
    }
    Ok(())
}

pub fn debate_history(entries: &[Value]) -> ValidationResult {
    if entries.len() > DEBATE_HISTORY_MAX_ENTRIES {
        return Err(FieldError::new(
            "debate_history",
            format!("Debate history cannot exceed {DEBATE_HISTORY_MAX_ENTRIES} entries"),
        ));
    }
    Ok(())
}

pub fn search_query(query: &str) -> ValidationResult {
    if query.chars().count() > SEARCH_QUERY_MAX_CHARS {
        return Err(FieldError::new(
            "q",
            format!("Search query cannot exceed {SEARCH_QUERY_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

pub fn new_analysis(new: &NewAnalysis) -> ValidationResult {
    patient_id(&new.patient_id)?;
    patient_data(&new.patient_data)?;
    debate_history(&new.debate_history)
}

pub fn analysis_update(update: &AnalysisUpdate) -> ValidationResult {
    if let Some(id) = &update.patient_id {
        patient_id(id)?;
    }
    if let Some(data) = &update.patient_data {
        patient_data(data)?;
    }
    if let Some(history) = &update.debate_history {
        debate_history(history)?;
    }
    Ok(())
}

pub fn new_case(new: &NewCaseEntry) -> ValidationResult {
    let diagnosis = new.final_diagnosis.trim();
    if diagnosis.is_empty() {
        return Err(FieldError::new("final_diagnosis", "Final diagnosis cannot be empty"));
    }
    if diagnosis.chars().count() > FINAL_DIAGNOSIS_MAX_CHARS {
        return Err(FieldError::new(
            "final_diagnosis",
            format!("Final diagnosis cannot exceed {FINAL_DIAGNOSIS_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

pub fn new_topic(new: &NewCmeTopic) -> ValidationResult {
    let topic = new.topic.trim();
    if topic.is_empty() {
        return Err(FieldError::new("topic", "Topic cannot be empty"));
    }
    if topic.chars().count() > CME_TOPIC_MAX_CHARS {
        return Err(FieldError::new(
            "topic",
            format!("Topic cannot exceed {CME_TOPIC_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}
