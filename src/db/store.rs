use async_trait::async_trait;

use crate::error::{BotError, BotResult};
use crate::models::{NotificationId, UserId};

use super::{
    connection::Database,
    models::{NewNotification, Notification},
};

/// Durable notification records shared by the conversation and the alert loop.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> BotResult<NotificationId>;

    async fn list_by_owner(&self, owner_id: UserId) -> BotResult<Vec<Notification>>;

    async fn list_active(&self) -> BotResult<Vec<Notification>>;

    /// `false` when the id is unknown or belongs to another owner.
    async fn delete_by_owner_and_id(
        &self,
        owner_id: UserId,
        id: NotificationId,
    ) -> BotResult<bool>;
}

#[async_trait]
impl NotificationStore for Database {
    async fn insert(&self, notification: NewNotification) -> BotResult<NotificationId> {
        self.insert_notification(&notification)
            .await
            .map_err(BotError::storage)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> BotResult<Vec<Notification>> {
        self.get_notifications_for_owner(owner_id)
            .await
            .map_err(BotError::storage)
    }

    async fn list_active(&self) -> BotResult<Vec<Notification>> {
        self.get_all_notifications().await.map_err(BotError::storage)
    }

    async fn delete_by_owner_and_id(
        &self,
        owner_id: UserId,
        id: NotificationId,
    ) -> BotResult<bool> {
        self.delete_owned_notification(owner_id, id)
            .await
            .map_err(BotError::storage)
    }
}
