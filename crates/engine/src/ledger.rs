//! The Ledger Store: durable keeper of expenses and weekly limits.
//!
//! The engine only depends on the [`LedgerStore`] trait. Two backends ship
//! with the crate:
//!
//! - [`DatabaseLedger`] backed by sea-orm (SQLite or PostgreSQL).
//! - [`MemoryLedger`] kept in process, for tests and embedding.

use async_trait::async_trait;

use crate::{Expense, NewExpense, StoreError, User};

mod database;
mod memory;

pub use database::DatabaseLedger;
pub use memory::MemoryLedger;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persists `expense` and returns it with its assigned identity.
    ///
    /// Fails with [`StoreError::Constraint`] when the user does not exist.
    async fn create_expense(&self, expense: NewExpense) -> Result<Expense, StoreError>;

    /// Sum of the user's expense amounts dated in the current calendar week.
    ///
    /// Returns `0` when there is nothing to sum, including for unknown users.
    async fn weekly_total(&self, user_id: i64) -> Result<i64, StoreError>;

    /// Fails with [`StoreError::NotFound`] when the user does not exist.
    async fn weekly_limit(&self, user_id: i64) -> Result<i64, StoreError>;

    /// Fails with [`StoreError::NotFound`] when no user was updated.
    async fn set_weekly_limit(&self, user_id: i64, new_limit: i64) -> Result<(), StoreError>;

    /// All expenses owned by the user, ordered by date then identity.
    async fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>, StoreError>;

    /// Deletes one expense owned by `user_id`.
    ///
    /// Fails with [`StoreError::NotFound`] when no row was deleted, which
    /// covers both unknown ids and expenses owned by someone else.
    async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when no user has that email.
    async fn user_by_email(&self, email: &str) -> Result<User, StoreError>;
}
