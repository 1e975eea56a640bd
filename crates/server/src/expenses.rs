//! Expenses API endpoints

use api_types::expense::{Classification, Expense, ExpenseNew, WeeklySummary};
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use engine::NewExpense;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
};

fn map_expense(expense: engine::Expense) -> Expense {
    Expense {
        id: expense.id,
        user_id: expense.user_id,
        amount: expense.amount,
        date: expense.date,
        category: expense.category,
    }
}

fn map_classification(classification: engine::Classification) -> Classification {
    match classification {
        engine::Classification::Normal => Classification::Normal,
        engine::Classification::Approaching => Classification::Approaching,
        engine::Classification::Exceeded => Classification::Exceeded,
    }
}

pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    payload: Result<Json<ExpenseNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), ServerError> {
    let Json(payload) = payload?;
    if payload.amount < 0 {
        return Err(ServerError::Generic("amount must be >= 0".to_string()));
    }

    let date = payload
        .date
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let mut expense = NewExpense::new(user_id, payload.amount, date);
    if let Some(category) = payload.category {
        expense = expense.category(category.trim());
    }

    // The notification outcome is already logged by the engine; callers only
    // see the persisted expense.
    let recorded = state.engine.record_expense(expense).await?;

    Ok((StatusCode::CREATED, Json(map_expense(recorded.expense))))
}

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let expenses = state.engine.list_expenses(user_id).await?;
    Ok(Json(expenses.into_iter().map(map_expense).collect()))
}

pub async fn weekly(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<WeeklySummary>, ServerError> {
    let summary = state.engine.weekly_summary(user_id).await?;
    Ok(Json(WeeklySummary {
        current_expenses: summary.current_expenses,
        limit: summary.limit,
        classification: map_classification(summary.classification),
    }))
}

pub async fn remove(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(expense_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    if expense_id <= 0 {
        return Err(ServerError::Generic("invalid expense id".to_string()));
    }

    state.engine.delete_expense(user_id, expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
