use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{Expense, LedgerStore, NewExpense, StoreError, User, week::WeekWindow};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, User>,
    expenses: BTreeMap<i64, Expense>,
    last_user_id: i64,
    last_expense_id: i64,
}

/// In-process ledger. Identities are assigned sequentially from 1.
#[derive(Debug)]
pub struct MemoryLedger {
    state: RwLock<State>,
    timezone: Tz,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            timezone: Tz::UTC,
        }
    }

    /// Timezone used to compute the calendar week.
    #[must_use]
    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Provision a user. Emails are not checked for uniqueness.
    pub fn add_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        weekly_spending_limit: i64,
    ) -> User {
        let mut state = self.write();
        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            weekly_spending_limit,
        };
        state.users.insert(user.id, user.clone());
        user
    }

    /// Sum of the user's expenses in the week containing `now`.
    pub fn weekly_total_at(&self, user_id: i64, now: DateTime<Utc>) -> i64 {
        let window = WeekWindow::containing(now, self.timezone);
        self.read()
            .expenses
            .values()
            .filter(|e| e.user_id == user_id && window.contains(e.date))
            .fold(0i64, |acc, e| acc.saturating_add(e.amount))
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn create_expense(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let mut state = self.write();
        if !state.users.contains_key(&expense.user_id) {
            return Err(StoreError::Constraint(format!(
                "user {} does not exist",
                expense.user_id
            )));
        }
        state.last_expense_id += 1;
        let expense = expense.with_id(state.last_expense_id);
        state.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn weekly_total(&self, user_id: i64) -> Result<i64, StoreError> {
        Ok(self.weekly_total_at(user_id, Utc::now()))
    }

    async fn weekly_limit(&self, user_id: i64) -> Result<i64, StoreError> {
        self.read()
            .users
            .get(&user_id)
            .map(|user| user.weekly_spending_limit)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
    }

    async fn set_weekly_limit(&self, user_id: i64, new_limit: i64) -> Result<(), StoreError> {
        let mut state = self.write();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        user.weekly_spending_limit = new_limit;
        Ok(())
    }

    async fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>, StoreError> {
        let mut expenses: Vec<Expense> = self
            .read()
            .expenses
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| (e.date, e.id));
        Ok(expenses)
    }

    async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<(), StoreError> {
        let mut state = self.write();
        let owned = state
            .expenses
            .get(&expense_id)
            .is_some_and(|expense| expense.user_id == user_id);
        if !owned {
            return Err(StoreError::NotFound(format!("expense {expense_id}")));
        }
        state.expenses.remove(&expense_id);
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.read()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {email}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn unknown_user_cannot_own_expenses() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .create_expense(NewExpense::new(9, 10, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn weekly_total_ignores_other_weeks_and_users() {
        let ledger = MemoryLedger::new();
        let alice = ledger.add_user("Alice", "alice@example.com", "hash", 100);
        let bob = ledger.add_user("Bob", "bob@example.com", "hash", 100);
        let now = Utc::now();

        for expense in [
            NewExpense::new(alice.id, 30, now),
            NewExpense::new(alice.id, 500, now - Duration::days(8)),
            NewExpense::new(bob.id, 70, now),
        ] {
            ledger.create_expense(expense).await.unwrap();
        }

        assert_eq!(ledger.weekly_total(alice.id).await.unwrap(), 30);
        assert_eq!(ledger.weekly_total(bob.id).await.unwrap(), 70);
        assert_eq!(ledger.weekly_total(1234).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() {
        let ledger = MemoryLedger::new();
        let alice = ledger.add_user("Alice", "alice@example.com", "hash", 100);
        let bob = ledger.add_user("Bob", "bob@example.com", "hash", 100);
        let expense = ledger
            .create_expense(NewExpense::new(alice.id, 30, Utc::now()))
            .await
            .unwrap();

        let err = ledger.delete_expense(bob.id, expense.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        ledger.delete_expense(alice.id, expense.id).await.unwrap();
        assert!(ledger.list_expenses(alice.id).await.unwrap().is_empty());
    }
}
