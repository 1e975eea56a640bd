//! Weekly limit endpoints.

use api_types::limit::{LimitUpdate, WeeklyLimit};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
};

pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<WeeklyLimit>, ServerError> {
    let weekly_limit = state.engine.weekly_limit(user_id).await?;
    Ok(Json(WeeklyLimit { weekly_limit }))
}

pub async fn set(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    payload: Result<Json<LimitUpdate>, JsonRejection>,
) -> Result<StatusCode, ServerError> {
    let Json(payload) = payload?;
    if payload.new_limit < 0 {
        return Err(ServerError::Generic("new_limit must be >= 0".to_string()));
    }

    state
        .engine
        .set_weekly_limit(user_id, payload.new_limit)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
