use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{CallerId, ValidJson},
    models::{CmeTopic, NewCmeTopic},
    validation,
};

pub async fn list_topics(State(state): State<AppState>, caller: CallerId) -> ApiResult<Vec<CmeTopic>> {
    Ok(Json(state.storage.list_topics(caller.as_str()).await?))
}

pub async fn create_topic(
    State(state): State<AppState>,
    caller: CallerId,
    ValidJson(new): ValidJson<NewCmeTopic>,
) -> Result<(StatusCode, Json<CmeTopic>), ApiError> {
    validation::new_topic(&new)?;
    let topic = state.storage.create_topic(caller.as_str(), new).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

pub async fn complete_topic(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> ApiResult<CmeTopic> {
    state
        .storage
        .complete_topic(caller.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("CME topic", id))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete_topic(caller.as_str(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("CME topic", id))
    }
}
