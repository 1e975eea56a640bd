//! Login endpoint.
//!
//! Exchanges email and password for the user id that `/api` requests carry
//! in the `x-user-id` header.

use api_types::auth::{Login, LoginResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{ServerError, server::ServerState};

pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<Login>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServerError> {
    let Json(payload) = payload?;
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ServerError::Generic(
            "email and password are required".to_string(),
        ));
    }

    let user = state
        .engine
        .authenticate(payload.email.trim(), &payload.password)
        .await?;
    tracing::debug!(user_id = user.id, "user authenticated");

    Ok(Json(LoginResponse { user_id: user.id }))
}
