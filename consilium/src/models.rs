use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Text field from provider output: null is empty, other scalars and
/// structures are rendered as compact JSON.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Numeric field from provider output: numbers and numeric strings are
/// kept, anything else reads as 0.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(number.filter(|n: &f64| n.is_finite()).unwrap_or_default())
}

/// Free-form patient fields supplied by the caller.
///
/// The only structural requirement is that it is a JSON object; prompt
/// builders read well-known keys and substitute defaults for missing ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientData(Map<String, Value>);

impl PatientData {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Text rendering of a field. Strings are returned as-is, null counts as
    /// missing and anything else is rendered as compact JSON.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    /// "firstName lastName", trimmed. Empty when neither is present.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.text_or("firstName", ""),
            self.text_or("lastName", "")
        )
        .trim()
        .to_string()
    }
}

/// One turn of the AI-council discussion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateTurn {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl DebateTurn {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarifyingQuestions {
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyRecommendation {
    pub specialty: String,
    pub reason: String,
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialistRecommendations {
    pub recommendations: Vec<SpecialtyRecommendation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Diagnosis {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    /// Expected in [0, 1]; not enforced.
    #[serde(deserialize_with = "lenient_number")]
    pub probability: f64,
    #[serde(deserialize_with = "lenient_text")]
    pub justification: String,
    /// "High", "Moderate" or "Low" as produced by the model.
    #[serde(deserialize_with = "lenient_text")]
    pub evidence_level: String,
}

impl Diagnosis {
    pub fn probability_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.probability)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialDiagnoses {
    pub diagnoses: Vec<Diagnosis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RejectedHypothesis {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationRecommendation {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub dosage: String,
    #[serde(deserialize_with = "lenient_text")]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinalReport {
    pub consensus_diagnosis: Vec<Diagnosis>,
    pub rejected_hypotheses: Vec<RejectedHypothesis>,
    pub recommended_tests: Vec<String>,
    pub treatment_plan: Vec<String>,
    pub medication_recommendations: Vec<MedicationRecommendation>,
    pub unexpected_findings: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugInteraction {
    #[serde(deserialize_with = "lenient_text")]
    pub interaction: String,
    /// "High", "Medium" or "Low" as produced by the model.
    #[serde(deserialize_with = "lenient_text")]
    pub severity: String,
    #[serde(deserialize_with = "lenient_text")]
    pub mechanism: String,
    #[serde(deserialize_with = "lenient_text")]
    pub management: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrugInteractions {
    pub interactions: Vec<DrugInteraction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmeTopicSuggestion {
    #[serde(deserialize_with = "lenient_text")]
    pub topic: String,
    #[serde(deserialize_with = "lenient_text")]
    pub relevance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmeTopicSuggestions {
    pub topics: Vec<CmeTopicSuggestion>,
}
