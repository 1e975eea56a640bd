//! The module contains the errors the engine can throw.
//!
//! Errors are split by the collaborator that produced them:
//!
//! - [`StoreError`] thrown by a [`LedgerStore`] backend.
//! - [`ChannelError`] thrown by a [`NotificationChannel`] backend.
//! - [`EngineError`] surfaced by [`Engine`] operations.
//!
//! Only [`PersistFailure`] is fatal while recording an expense: evaluation and
//! delivery failures after a successful write are reported as outcomes, never
//! as errors.
//!
//!  [`LedgerStore`]: crate::LedgerStore
//!  [`NotificationChannel`]: crate::NotificationChannel
//!  [`Engine`]: crate::Engine
//!  [`PersistFailure`]: EngineError::PersistFailure
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger Store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Notification Channel failures.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to persist expense: {0}")]
    PersistFailure(#[source] StoreError),
    #[error("threshold evaluation failed: {0}")]
    EvaluationFailure(#[source] StoreError),
    #[error("failed to deliver notification: {0}")]
    ChannelFailure(#[from] ChannelError),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("credential error: {0}")]
    Credentials(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => Self::KeyNotFound(what),
            other => Self::Store(other),
        }
    }
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        Self::Store(StoreError::Database(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_becomes_key_not_found() {
        let err = EngineError::from(StoreError::NotFound("user 7".to_string()));
        assert!(matches!(err, EngineError::KeyNotFound(ref what) if what == "user 7"));
    }

    #[test]
    fn other_store_errors_stay_store_errors() {
        let err = EngineError::from(StoreError::Constraint("fk".to_string()));
        assert!(matches!(err, EngineError::Store(StoreError::Constraint(_))));
    }

    #[test]
    fn persist_failure_keeps_its_source() {
        let err = EngineError::PersistFailure(StoreError::Constraint("unknown user".to_string()));
        assert_eq!(
            err.to_string(),
            "failed to persist expense: constraint violated: unknown user"
        );
    }
}
