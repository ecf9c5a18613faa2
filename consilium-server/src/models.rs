use chrono::{DateTime, Utc};
use consilium::{DebateTurn, PatientData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};

fn default_language() -> String {
    "en".to_string()
}

// ---------------------------------------------------------------------------
// AI operation requests

#[derive(Debug, Deserialize)]
pub struct PatientDataRequest {
    pub patient_data: PatientData,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalReportRequest {
    pub patient_data: PatientData,
    pub debate_history: Vec<DebateTurn>,
    pub diagnoses: Vec<Value>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct DrugInteractionRequest {
    pub medications: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct CmeTopicsRequest {
    pub analyses: Vec<Value>,
    #[serde(default = "default_language")]
    pub language: String,
}

// ---------------------------------------------------------------------------
// Analyses

/// A stored differential-diagnosis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: i64,
    pub user_id: String,
    pub patient_id: String,
    pub patient_data: Value,
    pub debate_history: Vec<Value>,
    pub final_report: Option<Value>,
    pub differential_diagnoses: Vec<Value>,
    pub selected_specialists: Vec<Value>,
    pub follow_up_history: Vec<Value>,
    pub detected_medications: Option<Value>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, PgRow> for Analysis {
    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            patient_id: row.try_get("patient_id")?,
            patient_data: row.try_get("patient_data")?,
            debate_history: row.try_get::<Json<Vec<Value>>, _>("debate_history")?.0,
            final_report: row.try_get("final_report")?,
            differential_diagnoses: row
                .try_get::<Json<Vec<Value>>, _>("differential_diagnoses")?
                .0,
            selected_specialists: row
                .try_get::<Json<Vec<Value>>, _>("selected_specialists")?
                .0,
            follow_up_history: row.try_get::<Json<Vec<Value>>, _>("follow_up_history")?.0,
            detected_medications: row.try_get("detected_medications")?,
            is_completed: row.try_get("is_completed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Analysis {
    pub fn patient_name(&self) -> String {
        match PatientData::from_value(self.patient_data.clone()) {
            Some(data) => data.full_name(),
            None => "Unknown".to_string(),
        }
    }

    /// Names of the final report's consensus diagnoses, in report order.
    pub fn consensus_diagnosis_names(&self) -> Vec<String> {
        self.final_report
            .as_ref()
            .and_then(|report| report.get("consensusDiagnosis"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|dx| dx.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn diagnosis_summary(&self) -> String {
        let consensus = self
            .final_report
            .as_ref()
            .filter(|report| report.is_object())
            .and_then(|report| report.get("consensusDiagnosis"));

        match consensus {
            Some(value) if is_empty_value(value) => "In progress".to_string(),
            Some(Value::Array(items)) => items[0]
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("No diagnosis")
                .to_string(),
            Some(_) => "No diagnosis".to_string(),
            None => "In progress".to_string(),
        }
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            id: self.id,
            patient_id: self.patient_id.clone(),
            patient_name: self.patient_name(),
            diagnosis_summary: self.diagnosis_summary(),
            is_completed: self.is_completed,
            created_at: self.created_at,
        }
    }
}

/// Null, false, zero and empty strings, lists or objects.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Lightweight list view of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: i64,
    pub patient_id: String,
    pub patient_name: String,
    pub diagnosis_summary: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnalysis {
    pub patient_id: String,
    pub patient_data: Value,
    #[serde(default)]
    pub debate_history: Vec<Value>,
    #[serde(default)]
    pub final_report: Option<Value>,
    #[serde(default)]
    pub differential_diagnoses: Vec<Value>,
    #[serde(default)]
    pub selected_specialists: Vec<Value>,
    #[serde(default)]
    pub follow_up_history: Vec<Value>,
    #[serde(default)]
    pub detected_medications: Option<Value>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisUpdate {
    pub patient_id: Option<String>,
    pub patient_data: Option<Value>,
    pub debate_history: Option<Vec<Value>>,
    pub final_report: Option<Value>,
    pub differential_diagnoses: Option<Vec<Value>>,
    pub selected_specialists: Option<Vec<Value>>,
    pub follow_up_history: Option<Vec<Value>>,
    pub detected_medications: Option<Value>,
    pub is_completed: Option<bool>,
}

impl AnalysisUpdate {
    pub fn apply(self, analysis: &mut Analysis) {
        if let Some(patient_id) = self.patient_id {
            analysis.patient_id = patient_id;
        }
        if let Some(patient_data) = self.patient_data {
            analysis.patient_data = patient_data;
        }
        if let Some(debate_history) = self.debate_history {
            analysis.debate_history = debate_history;
        }
        if let Some(final_report) = self.final_report {
            analysis.final_report = Some(final_report);
        }
        if let Some(differential_diagnoses) = self.differential_diagnoses {
            analysis.differential_diagnoses = differential_diagnoses;
        }
        if let Some(selected_specialists) = self.selected_specialists {
            analysis.selected_specialists = selected_specialists;
        }
        if let Some(follow_up_history) = self.follow_up_history {
            analysis.follow_up_history = follow_up_history;
        }
        if let Some(detected_medications) = self.detected_medications {
            analysis.detected_medications = Some(detected_medications);
        }
        if let Some(is_completed) = self.is_completed {
            analysis.is_completed = is_completed;
        }
        analysis.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    /// Accepts `created_at` and `-created_at`.
    pub fn parse(ordering: &str) -> Option<Self> {
        match ordering {
            "-created_at" => Some(SortOrder::NewestFirst),
            "created_at" => Some(SortOrder::OldestFirst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisFilter {
    pub is_completed: Option<bool>,
    pub patient_id: Option<String>,
    /// Case-insensitive substring of the serialized patient data.
    pub search: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl AnalysisFilter {
    pub fn matches(&self, analysis: &Analysis) -> bool {
        if let Some(done) = self.is_completed {
            if analysis.is_completed != done {
                return false;
            }
        }
        if let Some(patient_id) = &self.patient_id {
            if &analysis.patient_id != patient_id {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let haystack = analysis.patient_data.to_string().to_lowercase();
            if !haystack.contains(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Case library

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseLibraryEntry {
    pub id: i64,
    pub analysis_id: i64,
    #[serde(skip_serializing)]
    pub owner_id: String,
    pub tags: Vec<Value>,
    pub final_diagnosis: String,
    pub outcome: String,
    pub is_anonymous: bool,
    pub is_public: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, PgRow> for CaseLibraryEntry {
    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            analysis_id: row.try_get("analysis_id")?,
            owner_id: row.try_get("owner_id")?,
            tags: row.try_get::<Json<Vec<Value>>, _>("tags")?.0,
            final_diagnosis: row.try_get("final_diagnosis")?,
            outcome: row.try_get("outcome")?,
            is_anonymous: row.try_get("is_anonymous")?,
            is_public: row.try_get("is_public")?,
            view_count: row.try_get("view_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl CaseLibraryEntry {
    pub fn visible_to(&self, user_id: &str) -> bool {
        self.is_public || self.owner_id == user_id
    }

    /// Case-insensitive match against tags, final diagnosis and outcome.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        Value::Array(self.tags.clone())
            .to_string()
            .to_lowercase()
            .contains(&query)
            || self.final_diagnosis.to_lowercase().contains(&query)
            || self.outcome.to_lowercase().contains(&query)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCaseEntry {
    pub analysis_id: i64,
    #[serde(default)]
    pub tags: Vec<Value>,
    pub final_diagnosis: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default = "default_true")]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_public: bool,
}

// ---------------------------------------------------------------------------
// CME topics

pub const CME_TOPIC_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmeTopic {
    pub id: i64,
    pub user_id: String,
    pub topic: String,
    pub relevance: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, PgRow> for CmeTopic {
    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            topic: row.try_get("topic")?,
            relevance: row.try_get("relevance")?,
            is_completed: row.try_get("is_completed")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCmeTopic {
    pub topic: String,
    pub relevance: String,
    #[serde(default)]
    pub is_completed: bool,
}

// ---------------------------------------------------------------------------
// Dashboard

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_analyses: usize,
    pub common_diagnoses: Vec<DiagnosisCount>,
    pub feedback_accuracy: f64,
    pub recent_analyses: Vec<AnalysisSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn analysis(id: i64, patient_data: Value, final_report: Option<Value>) -> Analysis {
        let now = Utc::now();
        Analysis {
            id,
            user_id: "u1".into(),
            patient_id: "P-1".into(),
            patient_data,
            debate_history: vec![],
            final_report,
            differential_diagnoses: vec![],
            selected_specialists: vec![],
            follow_up_history: vec![],
            detected_medications: None,
            is_completed: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patient_name_from_patient_data() {
        let a = analysis(1, json!({"firstName": "Aziz", "lastName": "Karimov"}), None);
        assert_eq!(a.patient_name(), "Aziz Karimov");
        let b = analysis(2, json!(["not", "an", "object"]), None);
        assert_eq!(b.patient_name(), "Unknown");
    }

    #[test]
    fn diagnosis_summary_variants() {
        let done = analysis(
            1,
            json!({}),
            Some(json!({"consensusDiagnosis": [{"name": "Pneumonia"}, {"name": "Bronchitis"}]})),
        );
        assert_eq!(done.diagnosis_summary(), "Pneumonia");

        let unnamed = analysis(2, json!({}), Some(json!({"consensusDiagnosis": [{}]})));
        assert_eq!(unnamed.diagnosis_summary(), "No diagnosis");

        let pending = analysis(3, json!({}), None);
        assert_eq!(pending.diagnosis_summary(), "In progress");

        let empty = analysis(4, json!({}), Some(json!({"consensusDiagnosis": []})));
        assert_eq!(empty.diagnosis_summary(), "In progress");

        let odd = analysis(5, json!({}), Some(json!({"consensusDiagnosis": "Pneumonia"})));
        assert_eq!(odd.diagnosis_summary(), "No diagnosis");

        for blank in [json!(""), json!({}), json!(0), json!(false), json!(null)] {
            let report = json!({ "consensusDiagnosis": blank.clone() });
            let pending = analysis(6, json!({}), Some(report));
            assert_eq!(pending.diagnosis_summary(), "In progress", "{blank}");
        }

        let scalar_report = analysis(7, json!({}), Some(json!("done")));
        assert_eq!(scalar_report.diagnosis_summary(), "In progress");
    }

    #[test]
    fn filter_matches_search_case_insensitively() {
        let a = analysis(1, json!({"firstName": "Aziz"}), None);
        let filter = AnalysisFilter {
            search: Some("aziz".into()),
            ..Default::default()
        };
        assert!(filter.matches(&a));
        let filter = AnalysisFilter {
            is_completed: Some(false),
            ..Default::default()
        };
        assert!(!filter.matches(&a));
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut a = analysis(1, json!({"firstName": "Aziz"}), None);
        AnalysisUpdate {
            final_report: Some(json!({"consensusDiagnosis": []})),
            is_completed: Some(false),
            ..Default::default()
        }
        .apply(&mut a);
        assert_eq!(a.patient_data, json!({"firstName": "Aziz"}));
        assert!(a.final_report.is_some());
        assert!(!a.is_completed);
    }

    #[test]
    fn ordering_parse() {
        assert_eq!(SortOrder::parse("created_at"), Some(SortOrder::OldestFirst));
        assert_eq!(SortOrder::parse("-created_at"), Some(SortOrder::NewestFirst));
        assert_eq!(SortOrder::parse("patient_id"), None);
    }
}
