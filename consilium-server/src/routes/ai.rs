//! AI pipeline endpoints. Input is validated before any provider call.

use axum::{Json, extract::State};
use consilium::{
    ClarifyingQuestions, CmeTopicSuggestions, DrugInteractions, FinalReport, InitialDiagnoses,
    Language, SpecialistRecommendations,
};
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{CallerId, ValidJson},
    models::{CmeTopicsRequest, DrugInteractionRequest, FinalReportRequest, PatientDataRequest},
    validation,
};

pub async fn clarifying_questions(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(request): ValidJson<PatientDataRequest>,
) -> ApiResult<ClarifyingQuestions> {
    let language = Language::from_code(&request.language);
    info!(user_id = %caller.as_str(), language = language.code(), "Generating clarifying questions");

    let result = state
        .consultation
        .clarifying_questions(&request.patient_data, language)
        .await?;
    Ok(Json(result))
}

pub async fn recommend_specialists(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(request): ValidJson<PatientDataRequest>,
) -> ApiResult<SpecialistRecommendations> {
    let language = Language::from_code(&request.language);
    info!(user_id = %caller.as_str(), language = language.code(), "Recommending specialists");

    let result = state
        .consultation
        .recommend_specialists(&request.patient_data, language)
        .await?;
    Ok(Json(result))
}

pub async fn initial_diagnoses(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(request): ValidJson<PatientDataRequest>,
) -> ApiResult<InitialDiagnoses> {
    let language = Language::from_code(&request.language);
    info!(user_id = %caller.as_str(), language = language.code(), "Generating initial diagnoses");

    let result = state
        .consultation
        .initial_diagnoses(&request.patient_data, language)
        .await?;
    Ok(Json(result))
}

pub async fn final_report(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(request): ValidJson<FinalReportRequest>,
) -> ApiResult<FinalReport> {
    if request.debate_history.len() > validation::DEBATE_HISTORY_MAX_ENTRIES {
        return Err(ApiError::bad_request(
            "Invalid input data",
            serde_json::json!({
                "debate_history": [format!(
                    "Debate history cannot exceed {} entries",
                    validation::DEBATE_HISTORY_MAX_ENTRIES
                )]
            }),
        ));
    }

    let language = Language::from_code(&request.language);
    info!(
        user_id = %caller.as_str(),
        language = language.code(),
        debate_turns = request.debate_history.len(),
        diagnoses = request.diagnoses.len(),
        "Generating final report"
    );

    let result = state
        .consultation
        .final_report(
            &request.patient_data,
            &request.debate_history,
            &request.diagnoses,
            language,
        )
        .await?;
    Ok(Json(result))
}

pub async fn drug_interactions(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(request): ValidJson<DrugInteractionRequest>,
) -> ApiResult<DrugInteractions> {
    let language = Language::from_code(&request.language);
    info!(
        user_id = %caller.as_str(),
        language = language.code(),
        medications = request.medications.len(),
        "Checking drug interactions"
    );

    let result = state
        .consultation
        .drug_interactions(&request.medications, language)
        .await?;
    Ok(Json(result))
}

pub async fn cme_topics(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(request): ValidJson<CmeTopicsRequest>,
) -> ApiResult<CmeTopicSuggestions> {
    let language = Language::from_code(&request.language);
    info!(
        user_id = %caller.as_str(),
        language = language.code(),
        analyses = request.analyses.len(),
        "Suggesting CME topics"
    );

    let result = state
        .consultation
        .cme_topics(&request.analyses, language)
        .await?;
    Ok(Json(result))
}
