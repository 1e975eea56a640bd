//! Expense primitives.
//!
//! An `Expense` is created once, keyed by a store-assigned identity, and is
//! never mutated afterwards: it is only listed or deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// A persisted expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    /// Amount in minor units.
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub category: String,
}

/// An expense that has not been assigned an identity yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpense {
    pub user_id: i64,
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub category: String,
}

impl NewExpense {
    #[must_use]
    pub fn new(user_id: i64, amount: i64, date: DateTime<Utc>) -> Self {
        Self {
            user_id,
            amount,
            date,
            category: String::new(),
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Attach the identity assigned by the store.
    pub(crate) fn with_id(self, id: i64) -> Expense {
        Expense {
            id,
            user_id: self.user_id,
            amount: self.amount,
            date: self.date,
            category: self.category,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub date: DateTimeUtc,
    pub category: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewExpense> for ActiveModel {
    fn from(expense: &NewExpense) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(expense.user_id),
            amount: ActiveValue::Set(expense.amount),
            date: ActiveValue::Set(expense.date),
            category: ActiveValue::Set(expense.category.clone()),
        }
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            date: model.date,
            category: model.category,
        }
    }
}
