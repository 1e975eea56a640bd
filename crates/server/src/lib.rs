use axum::{
    Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse,
};
use engine::{EngineError, StoreError};

use serde::Serialize;
pub use server::{router, run_with_listener, spawn_with_listener};

mod auth;
mod expenses;
mod limits;
mod server;

pub mod types {
    pub mod expense {
        pub use api_types::expense::{Classification, Expense, ExpenseNew, WeeklySummary};
    }

    pub mod limit {
        pub use api_types::limit::{LimitUpdate, WeeklyLimit};
    }

    pub mod auth {
        pub use api_types::auth::{Login, LoginResponse};
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Unauthorized(String),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_store_error(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Constraint(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::PersistFailure(store) | EngineError::Store(store) => {
            status_for_store_error(store)
        }
        EngineError::EvaluationFailure(_)
        | EngineError::ChannelFailure(_)
        | EngineError::Credentials(_)
        | EngineError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(status: StatusCode, err: EngineError) -> String {
    if status.is_server_error() {
        tracing::error!("request failed: {err}");
        return "internal server error".to_string();
    }
    err.to_string()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                (status, message_for_engine_error(status, err))
            }
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_error() -> StoreError {
        StoreError::Database(engine::DbErr::Custom("connection reset".to_string()))
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_credentials_map_to_401() {
        let res = ServerError::from(EngineError::InvalidCredentials).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unknown_owner_maps_to_422() {
        let err = EngineError::PersistFailure(StoreError::Constraint("fk".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn store_outage_maps_to_500() {
        let res = ServerError::from(EngineError::PersistFailure(db_error())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let res = ServerError::from(EngineError::Store(db_error())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized("who?".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
