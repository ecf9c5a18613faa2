//! Prompt construction for each operation.
//!
//! Builders are pure: they take caller data and a target language and return
//! the instruction text together with the operation's fixed schema. Caller
//! text is embedded verbatim; nothing here defends against prompt injection.

use serde_json::Value;

use crate::{
    catalog::SPECIALTIES,
    language::Language,
    models::{DebateTurn, PatientData},
    schema::Operation,
};

/// Number of most recent debate turns summarized for the final report.
pub const DEBATE_TURN_LIMIT: usize = 10;
/// Characters kept from each debate turn's content.
pub const DEBATE_CONTENT_CHARS: usize = 200;
/// Number of prior analyses scanned for CME topic suggestions.
pub const CME_ANALYSES_LIMIT: usize = 10;
/// Number of diagnosis names collected for CME topic suggestions.
pub const CME_DIAGNOSES_LIMIT: usize = 20;

const NOT_PROVIDED: &str = "Not provided";

/// A ready-to-send prompt and the structured output contract for it.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub operation: Operation,
    pub text: String,
    pub schema: Value,
}

impl PromptSpec {
    fn new(operation: Operation, text: String) -> Self {
        Self {
            operation,
            text,
            schema: operation.schema(),
        }
    }
}

pub fn clarifying_questions(patient: &PatientData, language: Language) -> PromptSpec {
    let text = format!(
        r#"Based on the following patient information, generate 3-5 clarifying questions
that would help in making a more accurate diagnosis.

Patient Information:
- Complaints: {complaints}
- History: {history}
- Objective Data: {objective}
- Lab Results: {labs}

Write the questions in {language}.
Respond with JSON of the form {{"questions": ["Question 1?", "Question 2?"]}}."#,
        complaints = patient.text_or("complaints", NOT_PROVIDED),
        history = patient.text_or("history", NOT_PROVIDED),
        objective = patient.text_or("objectiveData", NOT_PROVIDED),
        labs = patient.text_or("labResults", NOT_PROVIDED),
        language = language.label(),
    );
    PromptSpec::new(Operation::ClarifyingQuestions, text)
}

fn specialty_catalog_block() -> String {
    SPECIALTIES
        .iter()
        .map(|specialty| format!("- \"{}\" ({})", specialty.name, specialty.scope))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn specialist_recommendations(patient: &PatientData, language: Language) -> PromptSpec {
    let text = format!(
        r#"You are a medical consultation coordinator. Based on the patient's condition,
symptoms and clinical data, recommend 5-6 MEDICAL SPECIALTIES that are the most
relevant and necessary for this specific case.

The selection MUST follow the disease or symptom type. Do not recommend a generic
team; tailor it to this condition. Recommend medical specialties only, never AI
model names. Models are assigned to specialties by the system.

Patient Information:
- Age: {age}
- Gender: {gender}
- Chief Complaints (Symptoms): {complaints}
- Medical History: {history}
- Objective Physical Examination Data: {objective}
- Laboratory Results: {labs}
- Current Medications: {medications}
- Additional Information: {additional}

Available Medical Specialties (use the EXACT names):
{catalog}

Instructions:
1. Identify the primary disease or symptom category.
2. Select 5-6 specialties that directly relate to the condition and its complications.
3. Consider related organ systems and likely comorbidities.
4. Order the specialties by relevance, most important first.
5. For each specialty explain why it is needed for THIS case.

Write the reasons in {language}. Respond with JSON of the form
{{"recommendations": [{{"specialty": "Cardiology", "reason": "Why this specialty is needed"}}]}}
and return exactly 5-6 recommendations."#,
        age = patient.text_or("age", NOT_PROVIDED),
        gender = patient.text_or("gender", NOT_PROVIDED),
        complaints = patient.text_or("complaints", NOT_PROVIDED),
        history = patient.text_or("history", NOT_PROVIDED),
        objective = patient.text_or("objectiveData", NOT_PROVIDED),
        labs = patient.text_or("labResults", NOT_PROVIDED),
        medications = patient.text_or("currentMedications", NOT_PROVIDED),
        additional = patient.text_or("additionalInfo", NOT_PROVIDED),
        catalog = specialty_catalog_block(),
        language = language.label(),
    );
    PromptSpec::new(Operation::RecommendSpecialists, text)
}

pub fn initial_diagnoses(patient: &PatientData, language: Language) -> PromptSpec {
    let text = format!(
        r#"Based on the patient information, generate 3-5 differential diagnoses
with probability estimates and justification.

Patient Information:
- Name: {name}
- Age: {age}
- Gender: {gender}
- Complaints: {complaints}
- History: {history}
- Objective Data: {objective}
- Lab Results: {labs}

Write the answer in {language}. Respond with JSON of the form
{{"diagnoses": [{{"name": "Diagnosis name", "probability": 0.75, "justification": "Why this diagnosis is likely", "evidenceLevel": "High/Moderate/Low"}}]}}"#,
        name = patient.full_name(),
        age = patient.text_or("age", NOT_PROVIDED),
        gender = patient.text_or("gender", NOT_PROVIDED),
        complaints = patient.text_or("complaints", NOT_PROVIDED),
        history = patient.text_or("history", NOT_PROVIDED),
        objective = patient.text_or("objectiveData", NOT_PROVIDED),
        labs = patient.text_or("labResults", NOT_PROVIDED),
        language = language.label(),
    );
    PromptSpec::new(Operation::InitialDiagnoses, text)
}

/// Condensed view of the last turns of the debate, one line per turn.
pub fn summarize_debate(history: &[DebateTurn]) -> String {
    let start = history.len().saturating_sub(DEBATE_TURN_LIMIT);
    history[start..]
        .iter()
        .map(|turn| {
            let author = turn.author.as_deref().unwrap_or("Unknown");
            let content: String = turn
                .content
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(DEBATE_CONTENT_CHARS)
                .collect();
            format!("{author}: {content}...")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn final_report(
    patient: &PatientData,
    debate_history: &[DebateTurn],
    diagnoses: &[Value],
    language: Language,
) -> PromptSpec {
    let considered =
        serde_json::to_string_pretty(diagnoses).unwrap_or_else(|_| "[]".to_string());
    let text = format!(
        r#"Generate a comprehensive medical report based on the AI council discussion.

Patient: {name}
Age: {age}, Gender: {gender}

Chief Complaints: {complaints}

Differential Diagnoses Considered:
{considered}

Debate Summary:
{debate}

Write the complete report in {language} covering:
- Consensus diagnosis (most likely diagnoses with probability)
- Rejected hypotheses and why
- Recommended tests
- Treatment plan
- Medication recommendations
- Any unexpected findings

Return the report as structured JSON."#,
        name = patient.full_name(),
        age = patient.text_or("age", ""),
        gender = patient.text_or("gender", ""),
        complaints = patient.text_or("complaints", ""),
        debate = summarize_debate(debate_history),
        language = language.label(),
    );
    PromptSpec::new(Operation::FinalReport, text)
}

pub fn drug_interactions(medications: &[String], language: Language) -> PromptSpec {
    let text = format!(
        r#"Check for potential drug interactions between these medications:
{medications}

Write the answer in {language}. Respond with JSON of the form
{{"interactions": [{{"interaction": "Drug A + Drug B", "severity": "High/Medium/Low", "mechanism": "How they interact", "management": "What to do"}}]}}"#,
        medications = medications.join(", "),
        language = language.label(),
    );
    PromptSpec::new(Operation::DrugInteractions, text)
}

/// Diagnosis names from the consensus of prior analyses' final reports.
///
/// Scans the first [`CME_ANALYSES_LIMIT`] records, keeps the first
/// [`CME_DIAGNOSES_LIMIT`] names and drops duplicates in first-seen order.
/// Records without the expected shape are skipped.
pub fn extract_case_diagnoses(analyses: &[Value]) -> Vec<String> {
    let names: Vec<String> = analyses
        .iter()
        .take(CME_ANALYSES_LIMIT)
        .filter_map(|analysis| analysis.get("final_report")?.get("consensusDiagnosis")?.as_array())
        .flatten()
        .filter(|dx| dx.is_object())
        .map(|dx| dx.get("name").and_then(Value::as_str).unwrap_or_default().to_string())
        .take(CME_DIAGNOSES_LIMIT)
        .collect();

    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

pub fn cme_topics(analyses: &[Value], language: Language) -> PromptSpec {
    let text = format!(
        r#"Based on these recent cases: {cases}

Suggest 3-5 CME (Continuing Medical Education) topics that would be the most
relevant for this physician. Write them in {language}.

Respond with JSON of the form
{{"topics": [{{"topic": "Topic name", "relevance": "Why this is relevant"}}]}}"#,
        cases = extract_case_diagnoses(analyses).join(", "),
        language = language.label(),
    );
    PromptSpec::new(Operation::CmeTopics, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient(value: Value) -> PatientData {
        PatientData::from_value(value).unwrap()
    }

    #[test]
    fn prompts_use_target_language_label() {
        let data = patient(json!({"complaints": "cough"}));
        for lang in Language::ALL {
            let spec = clarifying_questions(&data, lang);
            assert!(spec.text.contains(lang.label()), "{}", lang.code());
        }
        let fallback = clarifying_questions(&data, Language::from_code("xx"));
        assert!(fallback.text.contains("English"));
    }

    #[test]
    fn missing_fields_render_defaults() {
        let spec = clarifying_questions(&patient(json!({"complaints": "chest pain"})), Language::English);
        assert!(spec.text.contains("- Complaints: chest pain"));
        assert!(spec.text.contains("- History: Not provided"));
        assert_eq!(spec.operation, Operation::ClarifyingQuestions);
        assert_eq!(spec.schema, Operation::ClarifyingQuestions.schema());
    }

    #[test]
    fn specialist_prompt_lists_whole_catalog() {
        let spec = specialist_recommendations(&PatientData::default(), Language::Russian);
        for specialty in SPECIALTIES {
            assert!(spec.text.contains(&format!("\"{}\"", specialty.name)));
        }
        assert!(spec.text.contains("5-6"));
    }

    #[test]
    fn debate_summary_keeps_last_ten_truncated_turns() {
        let history: Vec<DebateTurn> = (0..15)
            .map(|i| DebateTurn::new(format!("Doctor{i}"), "x".repeat(500)))
            .collect();
        let summary = summarize_debate(&history);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), DEBATE_TURN_LIMIT);
        assert!(lines[0].starts_with("Doctor5: "));
        assert!(lines[9].starts_with("Doctor14: "));
        let expected = format!("Doctor5: {}...", "x".repeat(DEBATE_CONTENT_CHARS));
        assert_eq!(lines[0], expected);
    }

    #[test]
    fn debate_summary_truncates_on_char_boundaries() {
        let history = vec![DebateTurn::new("Невролог", "ж".repeat(300))];
        let summary = summarize_debate(&history);
        assert_eq!(summary.chars().filter(|c| *c == 'ж').count(), DEBATE_CONTENT_CHARS);
    }

    #[test]
    fn debate_summary_handles_missing_fields_and_empty_history() {
        assert_eq!(summarize_debate(&[]), "");
        let summary = summarize_debate(&[DebateTurn::default()]);
        assert_eq!(summary, "Unknown: ...");
    }

    #[test]
    fn final_report_embeds_diagnoses_and_debate() {
        let spec = final_report(
            &patient(json!({"firstName": "Aziz", "lastName": "Karimov", "complaints": "chest pain"})),
            &[DebateTurn::new("Cardiology", "Likely ACS")],
            &[json!({"name": "Acute coronary syndrome", "probability": 0.6})],
            Language::UzbekLatin,
        );
        assert!(spec.text.contains("Patient: Aziz Karimov"));
        assert!(spec.text.contains("Acute coronary syndrome"));
        assert!(spec.text.contains("Cardiology: Likely ACS..."));
        assert!(spec.text.contains("Uzbek (Latin script)"));
    }

    #[test]
    fn drug_prompt_joins_medications() {
        let spec = drug_interactions(
            &["WarfarinX".to_string(), "AspirinY".to_string()],
            Language::English,
        );
        assert!(spec.text.contains("WarfarinX, AspirinY"));
    }

    #[test]
    fn case_diagnoses_are_capped_and_deduplicated() {
        let report = |names: &[&str]| {
            json!({
                "final_report": {
                    "consensusDiagnosis": names.iter().map(|n| json!({"name": n})).collect::<Vec<_>>()
                }
            })
        };
        let mut analyses = vec![
            report(&["Pneumonia", "Asthma"]),
            json!("not a record"),
            json!({"final_report": null}),
            report(&["Pneumonia", "COPD"]),
        ];
        assert_eq!(
            extract_case_diagnoses(&analyses),
            vec!["Pneumonia", "Asthma", "COPD"]
        );

        // only the first ten records count
        analyses.truncate(1);
        for _ in 0..9 {
            analyses.push(json!({}));
        }
        analyses.push(report(&["Gout"]));
        assert!(!extract_case_diagnoses(&analyses).contains(&"Gout".to_string()));
    }

    #[test]
    fn case_diagnoses_take_at_most_twenty_names() {
        let names: Vec<Value> = (0..30).map(|i| json!({"name": format!("Dx{i}")})).collect();
        let analyses = vec![json!({"final_report": {"consensusDiagnosis": names}})];
        let extracted = extract_case_diagnoses(&analyses);
        assert_eq!(extracted.len(), CME_DIAGNOSES_LIMIT);
        assert_eq!(extracted.last().unwrap(), "Dx19");
    }
}
