use async_trait::async_trait;
use sqlx::PgPool;

use crate::types::{NewNotification, Notification, NotificationError};

/// Persistence contract for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// All notifications, ordered by id.
    async fn all(&self) -> Result<Vec<Notification>, NotificationError>;

    /// The notification with `id`, if any.
    async fn find(&self, id: i32) -> Result<Option<Notification>, NotificationError>;

    /// Stores a notification and returns it with its assigned id.
    async fn insert(&self, notification: NewNotification) -> Result<Notification, NotificationError>;

    /// Removes the notification with `id`. Returns whether a row was removed.
    async fn delete(&self, id: i32) -> Result<bool, NotificationError>;
}

/// A notification store backed by the `notifications` table.
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Creates a new instance of `PgNotificationStore` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn all(&self) -> Result<Vec<Notification>, NotificationError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, title, description, created_at, is_read
            FROM notifications
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn find(&self, id: i32) -> Result<Option<Notification>, NotificationError> {
        let notification = sqlx::query_as::<_, Notification>(
            "SELECT id, title, description, created_at, is_read FROM notifications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn insert(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (title, description, created_at, is_read)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, created_at, is_read
            "#,
        )
        .bind(&notification.title)
        .bind(&notification.description)
        .bind(notification.created_at)
        .bind(notification.is_read)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn delete(&self, id: i32) -> Result<bool, NotificationError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
