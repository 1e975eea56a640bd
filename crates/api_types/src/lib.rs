use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Amount in minor units. Must be >= 0.
        pub amount: i64,
        /// Defaults to the time the request is received.
        pub date: Option<DateTime<FixedOffset>>,
        pub category: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Expense {
        pub id: i64,
        pub user_id: i64,
        pub amount: i64,
        pub date: DateTime<Utc>,
        pub category: String,
    }

    /// Where the current week stands against the weekly limit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Classification {
        Normal,
        Approaching,
        Exceeded,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeeklySummary {
        pub current_expenses: i64,
        pub limit: i64,
        pub classification: Classification,
    }
}

pub mod limit {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LimitUpdate {
        /// New weekly limit in minor units. `0` disables notifications.
        pub new_limit: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeeklyLimit {
        pub weekly_limit: i64,
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub user_id: i64,
    }
}
