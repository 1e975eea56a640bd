//! Expense recording: persist, evaluate, notify.
//!
//! Only the write is fatal. Once the expense is durable, evaluation and
//! delivery are best effort: their failures are logged and reported through
//! [`NotifyOutcome`], and the recorded expense is always returned.

use crate::{
    Classification, Engine, EngineError, Expense, NewExpense, Notification, ResultEngine,
    ThresholdEvaluator,
};

/// What happened after the expense was persisted.
#[derive(Debug)]
pub enum NotifyOutcome {
    /// No channel is configured; nothing was evaluated.
    Disabled,
    /// The spend is `Normal`; nothing to send.
    Skipped(Classification),
    /// A notification was handed to the channel.
    Notified(Classification),
    /// [`EngineError::EvaluationFailure`] or [`EngineError::ChannelFailure`].
    Failed(EngineError),
}

/// Result of [`Engine::record_expense`].
#[derive(Debug)]
pub struct Recorded {
    pub expense: Expense,
    pub outcome: NotifyOutcome,
}

impl Engine {
    /// Record an expense and notify the user when the week's spend is
    /// approaching or over their limit.
    ///
    /// Fails only with [`EngineError::PersistFailure`]; in that case nothing
    /// is evaluated or sent.
    pub async fn record_expense(&self, expense: NewExpense) -> ResultEngine<Recorded> {
        let expense = self
            .ledger
            .create_expense(expense)
            .await
            .map_err(EngineError::PersistFailure)?;
        tracing::debug!(
            user_id = expense.user_id,
            expense_id = expense.id,
            amount = expense.amount,
            "expense recorded"
        );

        let outcome = self.notify_after_write(&expense).await;
        Ok(Recorded { expense, outcome })
    }

    async fn notify_after_write(&self, expense: &Expense) -> NotifyOutcome {
        let Some(channel) = self.channel.as_deref() else {
            return NotifyOutcome::Disabled;
        };
        let user_id = expense.user_id;

        let evaluation = match ThresholdEvaluator::new(self.ledger.as_ref())
            .evaluate(user_id)
            .await
        {
            Ok(evaluation) => evaluation,
            Err(err) => {
                tracing::warn!(
                    user_id,
                    expense_id = expense.id,
                    "threshold evaluation failed: {err}"
                );
                return NotifyOutcome::Failed(EngineError::EvaluationFailure(err));
            }
        };

        let classification = evaluation.classification;
        let Some(notification) = Notification::for_evaluation(user_id, &evaluation) else {
            tracing::debug!(
                user_id,
                current_expenses = evaluation.current_expenses,
                limit = evaluation.limit,
                "weekly spend within limit"
            );
            return NotifyOutcome::Skipped(classification);
        };

        match channel.publish(&notification).await {
            Ok(()) => NotifyOutcome::Notified(classification),
            Err(err) => {
                tracing::warn!(
                    user_id,
                    expense_id = expense.id,
                    classification = classification.as_str(),
                    "failed to publish notification: {err}"
                );
                NotifyOutcome::Failed(EngineError::ChannelFailure(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::{
        ChannelError, LedgerStore, MemoryLedger, NotificationChannel, StoreError, User,
    };

    /// Memory ledger whose operations can be made to fail on demand.
    #[derive(Default)]
    struct FlakyLedger {
        inner: MemoryLedger,
        fail_writes: AtomicBool,
        fail_totals: AtomicBool,
    }

    fn outage() -> StoreError {
        StoreError::Database(sea_orm::DbErr::Custom("store offline".to_string()))
    }

    #[async_trait]
    impl LedgerStore for FlakyLedger {
        async fn create_expense(&self, expense: NewExpense) -> Result<Expense, StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(outage());
            }
            self.inner.create_expense(expense).await
        }

        async fn weekly_total(&self, user_id: i64) -> Result<i64, StoreError> {
            if self.fail_totals.load(Ordering::SeqCst) {
                return Err(outage());
            }
            self.inner.weekly_total(user_id).await
        }

        async fn weekly_limit(&self, user_id: i64) -> Result<i64, StoreError> {
            self.inner.weekly_limit(user_id).await
        }

        async fn set_weekly_limit(&self, user_id: i64, new_limit: i64) -> Result<(), StoreError> {
            self.inner.set_weekly_limit(user_id, new_limit).await
        }

        async fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>, StoreError> {
            self.inner.list_expenses(user_id).await
        }

        async fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<(), StoreError> {
            self.inner.delete_expense(user_id, expense_id).await
        }

        async fn user_by_email(&self, email: &str) -> Result<User, StoreError> {
            self.inner.user_by_email(email).await
        }
    }

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<Notification>>,
        fail: AtomicBool,
    }

    impl RecordingChannel {
        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        async fn publish(&self, notification: &Notification) -> Result<(), ChannelError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ChannelError::Rejected("broker unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct Harness {
        engine: Engine,
        ledger: Arc<FlakyLedger>,
        channel: Arc<RecordingChannel>,
        user: User,
    }

    /// A user with `limit` who already spent `prior` this week.
    async fn harness(limit: i64, prior: i64) -> Harness {
        let ledger = Arc::new(FlakyLedger::default());
        let channel = Arc::new(RecordingChannel::default());
        let user = ledger
            .inner
            .add_user("Alice", "alice@example.com", "hash", limit);
        if prior > 0 {
            ledger
                .create_expense(NewExpense::new(user.id, prior, Utc::now()))
                .await
                .unwrap();
        }

        let engine = Engine::builder()
            .shared_ledger(ledger.clone())
            .channel(channel.clone())
            .build()
            .unwrap();

        Harness {
            engine,
            ledger,
            channel,
            user,
        }
    }

    fn expense(user: &User, amount: i64) -> NewExpense {
        NewExpense::new(user.id, amount, Utc::now()).category("groceries")
    }

    #[tokio::test]
    async fn scenario_a_normal_spend_sends_nothing() {
        let h = harness(100, 0).await;

        let recorded = h.engine.record_expense(expense(&h.user, 50)).await.unwrap();

        assert!(recorded.expense.id > 0);
        assert!(matches!(
            recorded.outcome,
            NotifyOutcome::Skipped(Classification::Normal)
        ));
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn scenario_b_approaching_limit_notifies() {
        let h = harness(100, 30).await;

        let recorded = h.engine.record_expense(expense(&h.user, 55)).await.unwrap();

        assert!(matches!(
            recorded.outcome,
            NotifyOutcome::Notified(Classification::Approaching)
        ));
        let sent = h.channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, h.user.id);
        assert_eq!(sent[0].current_expenses, 85);
        assert_eq!(sent[0].limit, 100);
        assert!(sent[0].message.contains("nearing"));
    }

    #[tokio::test]
    async fn reaching_the_limit_exactly_sends_nothing() {
        let h = harness(100, 60).await;

        let recorded = h.engine.record_expense(expense(&h.user, 40)).await.unwrap();

        assert!(matches!(
            recorded.outcome,
            NotifyOutcome::Skipped(Classification::Normal)
        ));
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn scenario_c_exceeded_limit_notifies() {
        let h = harness(100, 90).await;

        let recorded = h.engine.record_expense(expense(&h.user, 20)).await.unwrap();

        assert!(matches!(
            recorded.outcome,
            NotifyOutcome::Notified(Classification::Exceeded)
        ));
        let sent = h.channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].current_expenses, 110);
        assert_eq!(sent[0].limit, 100);
        assert!(sent[0].message.contains("exceeded"));
    }

    #[tokio::test]
    async fn scenario_d_evaluation_failure_keeps_the_expense() {
        let h = harness(100, 90).await;
        h.ledger.fail_totals.store(true, Ordering::SeqCst);

        let recorded = h.engine.record_expense(expense(&h.user, 20)).await.unwrap();

        assert!(matches!(
            recorded.outcome,
            NotifyOutcome::Failed(EngineError::EvaluationFailure(_))
        ));
        assert!(h.channel.sent().is_empty());
        let stored = h.ledger.list_expenses(h.user.id).await.unwrap();
        assert!(stored.contains(&recorded.expense));
    }

    #[tokio::test]
    async fn scenario_e_channel_failure_keeps_the_expense() {
        let h = harness(100, 90).await;
        h.channel.fail.store(true, Ordering::SeqCst);

        let recorded = h.engine.record_expense(expense(&h.user, 20)).await.unwrap();

        assert_eq!(recorded.expense.amount, 20);
        assert!(matches!(
            recorded.outcome,
            NotifyOutcome::Failed(EngineError::ChannelFailure(_))
        ));
    }

    #[tokio::test]
    async fn persist_failure_is_fatal_and_silent() {
        let h = harness(100, 90).await;
        h.ledger.fail_writes.store(true, Ordering::SeqCst);

        let err = h
            .engine
            .record_expense(expense(&h.user, 20))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::PersistFailure(_)));
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_a_persist_failure() {
        let h = harness(100, 0).await;

        let err = h
            .engine
            .record_expense(NewExpense::new(h.user.id + 1, 5, Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::PersistFailure(StoreError::Constraint(_))
        ));
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn zero_limit_never_notifies() {
        let h = harness(0, 10_000).await;

        let recorded = h.engine.record_expense(expense(&h.user, 1)).await.unwrap();

        assert!(matches!(
            recorded.outcome,
            NotifyOutcome::Skipped(Classification::Normal)
        ));
        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn without_channel_nothing_is_evaluated() {
        let ledger = Arc::new(FlakyLedger::default());
        let user = ledger.inner.add_user("Bob", "bob@example.com", "hash", 10);
        ledger.fail_totals.store(true, Ordering::SeqCst);
        let engine = Engine::builder()
            .shared_ledger(ledger.clone())
            .build()
            .unwrap();

        let recorded = engine.record_expense(expense(&user, 500)).await.unwrap();

        assert!(!engine.notifies());
        assert!(matches!(recorded.outcome, NotifyOutcome::Disabled));
    }

    #[tokio::test]
    async fn every_charge_over_the_limit_notifies_again() {
        let h = harness(100, 95).await;

        h.engine.record_expense(expense(&h.user, 10)).await.unwrap();
        h.engine.record_expense(expense(&h.user, 10)).await.unwrap();

        let totals: Vec<i64> = h
            .channel
            .sent()
            .iter()
            .map(|n| n.current_expenses)
            .collect();
        assert_eq!(totals, vec![105, 115]);
    }
}
