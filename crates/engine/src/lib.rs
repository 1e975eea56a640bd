//! Expense accounting against a per-user weekly spending limit.
//!
//! [`Engine`] records expenses through a [`LedgerStore`], classifies the
//! resulting weekly spend with the [`ThresholdEvaluator`] and hands
//! threshold [`Notification`]s to an optional [`NotificationChannel`].

use std::sync::Arc;

pub use channel::{
    DEFAULT_QUEUE, NotificationChannel, QueueChannel, QueuedNotification, WebhookChannel,
};
pub use error::{ChannelError, EngineError, StoreError};
pub use expenses::{Expense, NewExpense};
pub use ledger::{DatabaseLedger, LedgerStore, MemoryLedger};
pub use notification::Notification;
pub use sea_orm::DbErr;
pub use record::{NotifyOutcome, Recorded};
pub use threshold::{Classification, Evaluation, ThresholdEvaluator};
pub use users::User;
pub use week::WeekWindow;

pub mod credentials;

mod channel;
mod error;
mod expenses;
mod ledger;
mod notification;
mod record;
mod threshold;
mod users;
mod week;

type ResultEngine<T> = Result<T, EngineError>;

pub struct Engine {
    ledger: Arc<dyn LedgerStore>,
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("notifications", &self.channel.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// `true` when threshold notifications are enabled.
    pub fn notifies(&self) -> bool {
        self.channel.is_some()
    }

    /// Current weekly total, limit and classification for a user.
    pub async fn weekly_summary(&self, user_id: i64) -> ResultEngine<Evaluation> {
        Ok(ThresholdEvaluator::new(self.ledger.as_ref())
            .evaluate(user_id)
            .await?)
    }

    pub async fn list_expenses(&self, user_id: i64) -> ResultEngine<Vec<Expense>> {
        Ok(self.ledger.list_expenses(user_id).await?)
    }

    pub async fn delete_expense(&self, user_id: i64, expense_id: i64) -> ResultEngine<()> {
        self.ledger.delete_expense(user_id, expense_id).await?;
        tracing::debug!(user_id, expense_id, "expense deleted");
        Ok(())
    }

    pub async fn weekly_limit(&self, user_id: i64) -> ResultEngine<i64> {
        Ok(self.ledger.weekly_limit(user_id).await?)
    }

    pub async fn set_weekly_limit(&self, user_id: i64, new_limit: i64) -> ResultEngine<()> {
        self.ledger.set_weekly_limit(user_id, new_limit).await?;
        tracing::debug!(user_id, new_limit, "weekly limit updated");
        Ok(())
    }

    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        Ok(self.ledger.user_by_email(email).await?)
    }

    /// Check `password` against the stored hash of the user owning `email`.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the
    /// caller: both fail with [`EngineError::InvalidCredentials`].
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        let user = match self.ledger.user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => return Err(EngineError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };

        if !credentials::verify_password(&user.password_hash, password) {
            return Err(EngineError::InvalidCredentials);
        }
        Ok(user)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    ledger: Option<Arc<dyn LedgerStore>>,
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl EngineBuilder {
    /// Pass the required ledger
    pub fn ledger(mut self, ledger: impl LedgerStore + 'static) -> EngineBuilder {
        self.ledger = Some(Arc::new(ledger));
        self
    }

    /// Pass an already shared ledger
    pub fn shared_ledger(mut self, ledger: Arc<dyn LedgerStore>) -> EngineBuilder {
        self.ledger = Some(ledger);
        self
    }

    /// Enable threshold notifications through `channel`.
    ///
    /// Without a channel the notification step is skipped entirely.
    pub fn channel(mut self, channel: Arc<dyn NotificationChannel>) -> EngineBuilder {
        self.channel = Some(channel);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let ledger = self
            .ledger
            .ok_or_else(|| EngineError::InvalidConfig("a ledger is required".to_string()))?;

        Ok(Engine {
            ledger,
            channel: self.channel,
        })
    }
}
