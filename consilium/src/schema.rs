//! Fixed JSON Schema per operation, sent to the provider as the structured
//! output contract.

use serde_json::{Value, json};

use crate::catalog::specialty_names;

/// The six AI operations exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ClarifyingQuestions,
    RecommendSpecialists,
    InitialDiagnoses,
    FinalReport,
    DrugInteractions,
    CmeTopics,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::ClarifyingQuestions,
        Operation::RecommendSpecialists,
        Operation::InitialDiagnoses,
        Operation::FinalReport,
        Operation::DrugInteractions,
        Operation::CmeTopics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ClarifyingQuestions => "clarifying-questions",
            Operation::RecommendSpecialists => "recommend-specialists",
            Operation::InitialDiagnoses => "initial-diagnoses",
            Operation::FinalReport => "final-report",
            Operation::DrugInteractions => "drug-interactions",
            Operation::CmeTopics => "cme-topics",
        }
    }

    pub fn schema(&self) -> Value {
        match self {
            Operation::ClarifyingQuestions => clarifying_questions_schema(),
            Operation::RecommendSpecialists => specialist_recommendations_schema(),
            Operation::InitialDiagnoses => initial_diagnoses_schema(),
            Operation::FinalReport => final_report_schema(),
            Operation::DrugInteractions => drug_interactions_schema(),
            Operation::CmeTopics => cme_topics_schema(),
        }
    }
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn diagnosis_item(required: bool) -> Value {
    let mut item = json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "probability": { "type": "number" },
            "justification": { "type": "string" },
            "evidenceLevel": { "type": "string", "enum": ["High", "Moderate", "Low"] }
        }
    });
    if required {
        item["required"] = json!(["name", "probability", "justification", "evidenceLevel"]);
    }
    item
}

pub fn clarifying_questions_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "questions": string_list() },
        "required": ["questions"]
    })
}

pub fn specialist_recommendations_schema() -> Value {
    let names: Vec<&str> = specialty_names().collect();
    json!({
        "type": "object",
        "properties": {
            "recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "specialty": { "type": "string", "enum": names },
                        "reason": { "type": "string" }
                    },
                    "required": ["specialty", "reason"]
                },
                "minItems": 5,
                "maxItems": 6
            }
        },
        "required": ["recommendations"]
    })
}

pub fn initial_diagnoses_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "diagnoses": { "type": "array", "items": diagnosis_item(true) }
        },
        "required": ["diagnoses"]
    })
}

pub fn final_report_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "consensusDiagnosis": { "type": "array", "items": diagnosis_item(false) },
            "rejectedHypotheses": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "reason": { "type": "string" }
                    }
                }
            },
            "recommendedTests": string_list(),
            "treatmentPlan": string_list(),
            "medicationRecommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "dosage": { "type": "string" },
                        "notes": { "type": "string" }
                    }
                }
            },
            "unexpectedFindings": { "type": "string" }
        }
    })
}

pub fn drug_interactions_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "interactions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "interaction": { "type": "string" },
                        "severity": { "type": "string", "enum": ["High", "Medium", "Low"] },
                        "mechanism": { "type": "string" },
                        "management": { "type": "string" }
                    }
                }
            }
        }
    })
}

pub fn cme_topics_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "topics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "topic": { "type": "string" },
                        "relevance": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_has_an_object_schema() {
        for op in Operation::ALL {
            let schema = op.schema();
            assert_eq!(schema["type"], "object", "{}", op.name());
            assert!(schema["properties"].is_object(), "{}", op.name());
        }
    }

    #[test]
    fn specialist_schema_bounds_and_catalog() {
        let schema = specialist_recommendations_schema();
        let recs = &schema["properties"]["recommendations"];
        assert_eq!(recs["minItems"], 5);
        assert_eq!(recs["maxItems"], 6);
        let allowed = recs["items"]["properties"]["specialty"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(allowed.len(), 20);
        assert!(allowed.iter().any(|v| v == "Infectious Disease"));
    }

    #[test]
    fn diagnoses_require_all_fields_but_report_does_not() {
        let initial = initial_diagnoses_schema();
        assert_eq!(
            initial["properties"]["diagnoses"]["items"]["required"]
                .as_array()
                .unwrap()
                .len(),
            4
        );
        let report = final_report_schema();
        assert!(report["properties"]["consensusDiagnosis"]["items"]["required"].is_null());
    }
}
