//! Durable named queue stored in the `notification_queue` table.
//!
//! Publishing appends a JSON row; consumers read with [`QueueChannel::pending`]
//! and remove handled rows with [`QueueChannel::ack`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{ChannelError, Notification, NotificationChannel};

pub const DEFAULT_QUEUE: &str = "notifications_queue";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notification_queue")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub queue: String,
    pub payload: String,
    pub enqueued_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A notification waiting in the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedNotification {
    pub id: i64,
    pub enqueued_at: DateTime<Utc>,
    pub notification: Notification,
}

#[derive(Clone, Debug)]
pub struct QueueChannel {
    database: DatabaseConnection,
    queue: String,
}

impl QueueChannel {
    pub fn new(database: DatabaseConnection, queue: impl Into<String>) -> Self {
        Self {
            database,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Oldest first, at most `limit` entries.
    pub async fn pending(&self, limit: u64) -> Result<Vec<QueuedNotification>, ChannelError> {
        let rows = Entity::find()
            .filter(Column::Queue.eq(self.queue.as_str()))
            .order_by_asc(Column::Id)
            .limit(limit)
            .all(&self.database)
            .await?;

        rows.into_iter()
            .map(|row| -> Result<QueuedNotification, ChannelError> {
                Ok(QueuedNotification {
                    id: row.id,
                    enqueued_at: row.enqueued_at,
                    notification: serde_json::from_str(&row.payload)?,
                })
            })
            .collect()
    }

    /// Removes a handled entry. Returns `false` when it was already gone.
    pub async fn ack(&self, id: i64) -> Result<bool, ChannelError> {
        let result = Entity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::Queue.eq(self.queue.as_str()))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl NotificationChannel for QueueChannel {
    async fn publish(&self, notification: &Notification) -> Result<(), ChannelError> {
        let row = ActiveModel {
            id: ActiveValue::NotSet,
            queue: ActiveValue::Set(self.queue.clone()),
            payload: ActiveValue::Set(serde_json::to_string(notification)?),
            enqueued_at: ActiveValue::Set(Utc::now()),
        };
        Entity::insert(row).exec(&self.database).await?;

        tracing::info!(
            queue = %self.queue,
            user_id = notification.user_id,
            "notification published"
        );
        Ok(())
    }
}
