//! Threshold notifications.
//!
//! A notification is derived from an [`Evaluation`] every time; it is never
//! stored or deduplicated by the engine.

use serde::{Deserialize, Serialize};

use crate::{Classification, Evaluation};

const EXCEEDED_MESSAGE: &str = "You have exceeded your weekly expense limit!";
const APPROACHING_MESSAGE: &str = "You are nearing your weekly expense limit!";

/// Wire shape: `{user_id, message, current_expenses, limit}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: i64,
    pub message: String,
    pub current_expenses: i64,
    pub limit: i64,
}

impl Notification {
    /// Builds the notification for an evaluation, or `None` when the spend is
    /// `Normal`.
    pub fn for_evaluation(user_id: i64, evaluation: &Evaluation) -> Option<Self> {
        let message = match evaluation.classification {
            Classification::Exceeded => EXCEEDED_MESSAGE,
            Classification::Approaching => APPROACHING_MESSAGE,
            Classification::Normal => return None,
        };

        Some(Self {
            user_id,
            message: message.to_string(),
            current_expenses: evaluation.current_expenses,
            limit: evaluation.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(current_expenses: i64, limit: i64) -> Evaluation {
        Evaluation {
            current_expenses,
            limit,
            classification: Classification::classify(current_expenses, limit),
        }
    }

    #[test]
    fn normal_spend_builds_nothing() {
        assert_eq!(Notification::for_evaluation(1, &evaluation(50, 100)), None);
    }

    #[test]
    fn message_follows_classification() {
        let nearing = Notification::for_evaluation(1, &evaluation(85, 100)).unwrap();
        assert_eq!(nearing.message, APPROACHING_MESSAGE);

        let exceeded = Notification::for_evaluation(1, &evaluation(110, 100)).unwrap();
        assert_eq!(exceeded.message, EXCEEDED_MESSAGE);
        assert_eq!(exceeded.current_expenses, 110);
        assert_eq!(exceeded.limit, 100);
    }

    #[test]
    fn serializes_with_snake_case_keys() {
        let notification = Notification::for_evaluation(3, &evaluation(85, 100)).unwrap();
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "user_id": 3,
                "message": APPROACHING_MESSAGE,
                "current_expenses": 85,
                "limit": 100,
            })
        );
    }
}
