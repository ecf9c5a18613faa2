use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{CallerId, ValidJson},
    models::{CaseLibraryEntry, NewCaseEntry},
    storage::StorageError,
    validation,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn list_cases(
    State(state): State<AppState>,
    caller: CallerId,
) -> ApiResult<Vec<CaseLibraryEntry>> {
    Ok(Json(state.storage.list_cases(caller.as_str()).await?))
}

pub async fn create_case(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(new): ValidJson<NewCaseEntry>,
) -> Result<(StatusCode, Json<CaseLibraryEntry>), ApiError> {
    validation::new_case(&new)?;
    let analysis_id = new.analysis_id;

    match state.storage.create_case(caller.as_str(), new).await {
        Ok(entry) => {
            info!(
                user_id = %caller.as_str(),
                case_id = entry.id,
                analysis_id,
                is_public = entry.is_public,
                "Case added to library"
            );
            Ok((StatusCode::CREATED, Json(entry)))
        }
        Err(StorageError::NotFound(_)) => Err(ApiError::not_found("Analysis", analysis_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_case(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> ApiResult<CaseLibraryEntry> {
    state
        .storage
        .get_case(caller.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Case", id))
}

pub async fn record_view(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let view_count = state
        .storage
        .record_case_view(caller.as_str(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Case", id))?;
    Ok(Json(json!({ "view_count": view_count })))
}

/// Empty query gives no results rather than everything.
pub async fn search_cases(
    State(state): State<AppState>,
    caller: CallerId,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<CaseLibraryEntry>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Ok(Json(Vec::new()));
    }
    validation::search_query(term)?;

    let hits = state.storage.search_cases(caller.as_str(), term).await?;
    info!(user_id = %caller.as_str(), hits = hits.len(), "Case library searched");
    Ok(Json(hits))
}
