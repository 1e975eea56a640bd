//! Weekly spend classification.
//!
//! The evaluator issues two reads (weekly total, then weekly limit) and
//! classifies the result. It never writes and never swallows a failed read.

use serde::{Deserialize, Serialize};

use crate::{LedgerStore, StoreError};

/// Where a weekly total stands against the weekly limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    Approaching,
    Exceeded,
}

impl Classification {
    /// Classify `total` against `limit`.
    ///
    /// - `limit <= 0` means no limit is configured: always `Normal`.
    /// - `total > limit` is `Exceeded`; `total == limit` is still `Normal`.
    /// - `total > 80% of limit` (strict) and below the limit is `Approaching`.
    ///
    /// The 80% comparison is done in integers (`5 * total > 4 * limit`) so the
    /// boundary does not depend on float rounding.
    pub fn classify(total: i64, limit: i64) -> Self {
        if limit <= 0 {
            return Self::Normal;
        }
        if total > limit {
            return Self::Exceeded;
        }
        if total == limit {
            return Self::Normal;
        }
        if i128::from(total) * 5 > i128::from(limit) * 4 {
            return Self::Approaching;
        }
        Self::Normal
    }

    pub fn should_notify(self) -> bool {
        matches!(self, Self::Approaching | Self::Exceeded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Approaching => "approaching",
            Self::Exceeded => "exceeded",
        }
    }
}

/// Snapshot of a user's week at evaluation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub current_expenses: i64,
    pub limit: i64,
    pub classification: Classification,
}

/// Reads the weekly total and limit for a user and classifies them.
pub struct ThresholdEvaluator<'a> {
    ledger: &'a dyn LedgerStore,
}

impl<'a> ThresholdEvaluator<'a> {
    pub fn new(ledger: &'a dyn LedgerStore) -> Self {
        Self { ledger }
    }

    pub async fn evaluate(&self, user_id: i64) -> Result<Evaluation, StoreError> {
        let current_expenses = self.ledger.weekly_total(user_id).await?;
        let limit = self.ledger.weekly_limit(user_id).await?;

        Ok(Evaluation {
            current_expenses,
            limit,
            classification: Classification::classify(current_expenses, limit),
        })
    }
}
