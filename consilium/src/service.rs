use serde_json::Value;
use std::time::Instant;
use tracing::info;

use crate::{
    error::Result,
    gateway::AiGateway,
    language::Language,
    models::{
        ClarifyingQuestions, CmeTopicSuggestions, DebateTurn, DrugInteractions, FinalReport,
        InitialDiagnoses, PatientData, SpecialistRecommendations,
    },
    normalize,
    prompts::{self, PromptSpec},
};

/// Prompt → provider → normalizer pipeline for each AI operation.
///
/// Stateless apart from the injected gateway; every method performs exactly
/// one provider call.
#[derive(Clone, Debug)]
pub struct ConsultationService {
    gateway: AiGateway,
}

impl ConsultationService {
    pub fn new(gateway: AiGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &AiGateway {
        &self.gateway
    }

    async fn run(&self, spec: &PromptSpec, language: Language) -> Result<Value> {
        let started = Instant::now();
        let value = self.gateway.call_structured(spec).await?;
        info!(
            operation = spec.operation.name(),
            language = language.code(),
            provider = %self.gateway.provider(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "AI operation completed"
        );
        Ok(value)
    }

    pub async fn clarifying_questions(
        &self,
        patient: &PatientData,
        language: Language,
    ) -> Result<ClarifyingQuestions> {
        let spec = prompts::clarifying_questions(patient, language);
        let value = self.run(&spec, language).await?;
        Ok(normalize::clarifying_questions(&value))
    }

    pub async fn recommend_specialists(
        &self,
        patient: &PatientData,
        language: Language,
    ) -> Result<SpecialistRecommendations> {
        let spec = prompts::specialist_recommendations(patient, language);
        let value = self.run(&spec, language).await?;
        Ok(normalize::specialist_recommendations(&value))
    }

    pub async fn initial_diagnoses(
        &self,
        patient: &PatientData,
        language: Language,
    ) -> Result<InitialDiagnoses> {
        let spec = prompts::initial_diagnoses(patient, language);
        let value = self.run(&spec, language).await?;
        Ok(normalize::initial_diagnoses(&value))
    }

    pub async fn final_report(
        &self,
        patient: &PatientData,
        debate_history: &[DebateTurn],
        diagnoses: &[Value],
        language: Language,
    ) -> Result<FinalReport> {
        let spec = prompts::final_report(patient, debate_history, diagnoses, language);
        let value = self.run(&spec, language).await?;
        Ok(normalize::final_report(&value))
    }

    pub async fn drug_interactions(
        &self,
        medications: &[String],
        language: Language,
    ) -> Result<DrugInteractions> {
        let spec = prompts::drug_interactions(medications, language);
        let value = self.run(&spec, language).await?;
        Ok(normalize::drug_interactions(&value))
    }

    pub async fn cme_topics(
        &self,
        analyses: &[Value],
        language: Language,
    ) -> Result<CmeTopicSuggestions> {
        let spec = prompts::cme_topics(analyses, language);
        let value = self.run(&spec, language).await?;
        Ok(normalize::cme_topics(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::find_specialty, error::AiError, mock::ScriptedGateway};
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> (ConsultationService, Arc<ScriptedGateway>) {
        let backend = Arc::new(ScriptedGateway::new());
        let gateway = AiGateway::new(backend.clone(), "gemini-2.0-flash-exp");
        (ConsultationService::new(gateway), backend)
    }

    fn patient(value: Value) -> PatientData {
        PatientData::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn chest_pain_yields_at_most_ten_questions() {
        let (service, backend) = service();
        let questions: Vec<String> = (1..=12).map(|i| format!("Question {i}?")).collect();
        backend.push_json(json!({ "questions": questions }));

        let result = service
            .clarifying_questions(
                &patient(json!({"complaints": "chest pain", "history": "hypertension"})),
                Language::from_code("en"),
            )
            .await
            .unwrap();

        assert!(result.questions.len() <= 10);
        assert!(result.questions.iter().all(|q| !q.is_empty()));

        let request = &backend.requests()[0];
        assert!(request.prompt.contains("chest pain"));
        assert!(request.prompt.contains("hypertension"));
        assert!(request.schema.is_some());
        assert!(!request.use_search);
    }

    #[tokio::test]
    async fn cardiac_case_gets_catalog_specialists_with_models() {
        let (service, backend) = service();
        backend.push_text(
            "```json\n".to_string()
                + &json!({
                    "recommendations": [
                        {"specialty": "Cardiology", "reason": "Chest pain with ST changes"},
                        {"specialty": "Emergency Medicine", "reason": "Acute presentation"},
                        {"specialty": "Radiology", "reason": "Coronary CT angiography"},
                        {"specialty": "Internal Medicine", "reason": "Comorbidities"},
                        {"specialty": "Endocrinology", "reason": "Diabetes control"}
                    ]
                })
                .to_string()
                + "\n```",
        );

        let result = service
            .recommend_specialists(
                &patient(json!({"complaints": "crushing chest pain radiating to left arm"})),
                Language::English,
            )
            .await
            .unwrap();

        assert!((5..=6).contains(&result.recommendations.len()));
        for rec in &result.recommendations {
            assert!(find_specialty(&rec.specialty).is_some(), "{}", rec.specialty);
            assert!(!rec.model.is_empty());
        }
        assert_eq!(result.recommendations[4].model, "Grok");
    }

    #[tokio::test]
    async fn final_report_with_empty_debate_is_valid() {
        let (service, backend) = service();
        backend.push_json(json!({
            "consensusDiagnosis": [{"name": "Unstable angina", "probability": 0.55,
                                    "justification": "Rest pain", "evidenceLevel": "Moderate"}],
            "recommendedTests": ["Troponin series"],
            "unexpectedFindings": "None"
        }));

        let report = service
            .final_report(&PatientData::default(), &[], &[], Language::Russian)
            .await
            .unwrap();

        assert_eq!(report.consensus_diagnosis.len(), 1);
        assert!(report.rejected_hypotheses.is_empty());
        assert!(backend.requests()[0].prompt.contains("Debate Summary:"));
    }

    #[tokio::test]
    async fn interactions_have_known_severity() {
        let (service, backend) = service();
        backend.push_json(json!({
            "interactions": [
                {"interaction": "WarfarinX + AspirinY", "severity": "High",
                 "mechanism": "Additive anticoagulant and antiplatelet effect",
                 "management": "Avoid combination or monitor INR closely"},
                {"interaction": "AspirinY + WarfarinX (GI)", "severity": "Medium",
                 "mechanism": "Mucosal injury", "management": "Add PPI"}
            ]
        }));

        let result = service
            .drug_interactions(
                &["WarfarinX".to_string(), "AspirinY".to_string()],
                Language::English,
            )
            .await
            .unwrap();

        assert!(!result.interactions.is_empty());
        for interaction in &result.interactions {
            assert!(["High", "Medium", "Low"].contains(&interaction.severity.as_str()));
        }
    }

    #[tokio::test]
    async fn cme_topics_prompt_lists_prior_diagnoses() {
        let (service, backend) = service();
        backend.push_json(json!({"topics": [{"topic": "ACS update", "relevance": "Recent cases"}]}));

        let analyses = vec![json!({
            "final_report": {"consensusDiagnosis": [{"name": "NSTEMI"}, {"name": "Heart failure"}]}
        })];
        let result = service.cme_topics(&analyses, Language::English).await.unwrap();

        assert_eq!(result.topics[0].topic, "ACS update");
        assert!(backend.requests()[0].prompt.contains("NSTEMI, Heart failure"));
    }

    #[tokio::test]
    async fn invalid_json_maps_to_bad_input() {
        let (service, backend) = service();
        backend.push_text("```json\n{\"diagnoses\": [oops\n```");
        let err = service
            .initial_diagnoses(&PatientData::default(), Language::English)
            .await
            .unwrap_err();
        assert_eq!(err, AiError::InvalidRequest);
    }

    #[tokio::test]
    async fn provider_failure_is_terminal_and_not_retried() {
        let (service, backend) = service();
        backend.push_failure("Rate limit exceeded");
        backend.push_json(json!({"questions": ["never used"]}));

        let err = service
            .clarifying_questions(&PatientData::default(), Language::English)
            .await
            .unwrap_err();
        assert_eq!(err, AiError::RateLimited);
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(backend.remaining(), 1);
    }
}
