use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    AppState, dashboard,
    error::{ApiError, ApiResult},
    extract::{CallerId, ValidJson},
    models::{
        Analysis, AnalysisFilter, AnalysisSummary, AnalysisUpdate, DashboardStats, NewAnalysis,
        SortOrder,
    },
    validation,
};

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisListQuery {
    pub is_completed: Option<bool>,
    pub patient_id: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl AnalysisListQuery {
    fn into_filter(self) -> Result<AnalysisFilter, ApiError> {
        let order = match self.ordering.as_deref() {
            None | Some("") => SortOrder::default(),
            Some(ordering) => SortOrder::parse(ordering).ok_or_else(|| {
                ApiError::bad_request(
                    "Invalid input data",
                    json!({ "ordering": ["Must be one of: created_at, -created_at"] }),
                )
            })?,
        };
        Ok(AnalysisFilter {
            is_completed: self.is_completed,
            patient_id: self.patient_id.filter(|id| !id.is_empty()),
            search: self.search.filter(|term| !term.trim().is_empty()),
            order,
            limit: None,
        })
    }
}

pub async fn list_analyses(
    State(state): State<AppState>,
    caller: CallerId,
    query: Result<Query<AnalysisListQuery>, QueryRejection>,
) -> ApiResult<Vec<AnalysisSummary>> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request("Invalid input data", json!({ "query": [rejection.body_text()] }))
    })?;
    let filter = query.into_filter()?;

    let analyses = state.storage.list_analyses(caller.as_str(), &filter).await?;
    Ok(Json(analyses.iter().map(Analysis::summary).collect()))
}

pub async fn create_analysis(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(mut new): ValidJson<NewAnalysis>,
) -> Result<(StatusCode, Json<Analysis>), ApiError> {
    new.patient_id = new.patient_id.trim().to_string();
    validation::new_analysis(&new)?;

    let analysis = state.storage.create_analysis(caller.as_str(), new).await?;
    info!(
        user_id = %caller.as_str(),
        analysis_id = analysis.id,
        patient_id = %analysis.patient_id,
        "Analysis created"
    );
    Ok((StatusCode::CREATED, Json(analysis)))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> ApiResult<Analysis> {
    state
        .storage
        .get_analysis(caller.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Analysis", id))
}

pub async fn update_analysis(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
    ValidJson(mut update): ValidJson<AnalysisUpdate>,
) -> ApiResult<Analysis> {
    update.patient_id = update.patient_id.map(|pid| pid.trim().to_string());
    validation::analysis_update(&update)?;

    let analysis = state
        .storage
        .update_analysis(caller.as_str(), id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Analysis", id))?;
    info!(user_id = %caller.as_str(), analysis_id = id, "Analysis updated");
    Ok(Json(analysis))
}

pub async fn delete_analysis(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete_analysis(caller.as_str(), id).await? {
        info!(user_id = %caller.as_str(), analysis_id = id, "Analysis deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Analysis", id))
    }
}

pub async fn complete_analysis(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> ApiResult<Analysis> {
    let update = AnalysisUpdate {
        is_completed: Some(true),
        ..Default::default()
    };
    state
        .storage
        .update_analysis(caller.as_str(), id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Analysis", id))
}

/// Every analysis of the same patient, oldest first.
pub async fn longitudinal(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> ApiResult<Vec<AnalysisSummary>> {
    let anchor = state
        .storage
        .get_analysis(caller.as_str(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Analysis", id))?;

    let filter = AnalysisFilter {
        patient_id: Some(anchor.patient_id),
        order: SortOrder::OldestFirst,
        ..Default::default()
    };
    let history = state.storage.list_analyses(caller.as_str(), &filter).await?;
    Ok(Json(history.iter().map(Analysis::summary).collect()))
}

pub async fn recent(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Vec<AnalysisSummary>> {
    let filter = AnalysisFilter {
        limit: Some(dashboard::RECENT_ANALYSES),
        ..Default::default()
    };
    let analyses = state.storage.list_analyses(caller.as_str(), &filter).await?;
    Ok(Json(analyses.iter().map(Analysis::summary).collect()))
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<DashboardStats> {
    let user_id = caller.as_str();
    let total = state.storage.count_analyses(user_id).await?;

    let completed = state
        .storage
        .list_analyses(
            user_id,
            &AnalysisFilter {
                is_completed: Some(true),
                limit: Some(dashboard::DIAGNOSIS_WINDOW),
                ..Default::default()
            },
        )
        .await?;
    let newest = state
        .storage
        .list_analyses(
            user_id,
            &AnalysisFilter {
                limit: Some(dashboard::RECENT_ANALYSES),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(dashboard::build_stats(total, &completed, &newest)))
}
