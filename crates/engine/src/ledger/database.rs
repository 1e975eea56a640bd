use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::{
    ActiveValue, DatabaseConnection, DbErr, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    prelude::*, sea_query::Expr,
};

use crate::{
    Expense, LedgerStore, NewExpense, StoreError, User, expenses, users, week::WeekWindow,
};

/// Ledger backed by a relational database through sea-orm.
///
/// The schema is owned by the `migration` crate.
#[derive(Clone, Debug)]
pub struct DatabaseLedger {
    database: DatabaseConnection,
    timezone: Tz,
}

impl DatabaseLedger {
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            timezone: Tz::UTC,
        }
    }

    /// Timezone used to compute the calendar week.
    #[must_use]
    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Provision a user. Fails with [`StoreError::Constraint`] on a duplicate
    /// email.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        weekly_spending_limit: i64,
    ) -> Result<User, StoreError> {
        let user = users::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            email: ActiveValue::Set(email.to_string()),
            password_hash: ActiveValue::Set(password_hash.to_string()),
            weekly_spending_limit: ActiveValue::Set(weekly_spending_limit),
        }
        .insert(&self.database)
        .await
        .map_err(constraint_or_database)?;

        Ok(user.into())
    }

    /// Sum of the user's expenses in the week containing `now`.
    pub async fn weekly_total_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let window = WeekWindow::containing(now, self.timezone);

        // Summed here rather than with SUM(): PostgreSQL widens SUM(bigint)
        // to numeric.
        let amounts: Vec<i64> = expenses::Entity::find()
            .select_only()
            .column(expenses::Column::Amount)
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Date.gte(window.start))
            .filter(expenses::Column::Date.lt(window.end))
            .into_tuple()
            .all(&self.database)
            .await?;

        Ok(amounts.into_iter().fold(0i64, i64::saturating_add))
    }
}

fn constraint_or_database(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(msg))
        | Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::Constraint(msg),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl LedgerStore for DatabaseLedger {
    async fn create_expense(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let model = expenses::ActiveModel::from(&expense)
            .insert(&self.database)
            .await
            .map_err(constraint_or_database)?;

        Ok(model.into())
    }

    async fn weekly_total(&self, user_id: i64) -> Result<i64, StoreError> {
        self.weekly_total_at(user_id, Utc::now()).await
    }

    async fn weekly_limit(&self, user_id: i64) -> Result<i64, StoreError> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(|user| user.weekly_spending_limit)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
    }

    async fn set_weekly_limit(&self, user_id: i64, new_limit: i64) -> Result<(), StoreError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::WeeklySpendingLimit, Expr::value(new_limit))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.database)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>, StoreError> {
        let models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_asc(expenses::Column::Date)
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;

        Ok(models.into_iter().map(Expense::from).collect())
    }

    async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<(), StoreError> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::Id.eq(expense_id))
            .filter(expenses::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("expense {expense_id}")));
        }
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<User, StoreError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| StoreError::NotFound(format!("user {email}")))
    }
}
