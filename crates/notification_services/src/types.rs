use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Notification row as stored in the `notifications` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Notification {
    /// Database-assigned identifier
    pub id: i32,
    /// Short headline
    pub title: String,
    /// Body text
    pub description: String,
    /// Time at which the notification was created
    pub created_at: DateTime<Utc>,
    /// Whether the notification has been read
    pub is_read: bool,
}

/// Values for a notification that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Short headline
    pub title: String,
    /// Body text
    pub description: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Read flag, false for new notifications
    pub is_read: bool,
}

/// Request structure for creating a notification
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotificationCreateDto {
    /// Short headline
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    /// Body text
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Response structure for a notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReadDto {
    /// Identifier of the notification
    pub id: i32,
    /// Short headline
    pub title: String,
    /// Body text
    pub description: String,
    /// Time at which the notification was created
    pub created_at: DateTime<Utc>,
    /// Whether the notification has been read
    pub is_read: bool,
}

impl From<Notification> for NotificationReadDto {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            title: notification.title,
            description: notification.description,
            created_at: notification.created_at,
            is_read: notification.is_read,
        }
    }
}

/// Custom error type for notification operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Notification not found
    #[error("Notification not found")]
    NotFound,
}

impl actix_web::ResponseError for NotificationError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            NotificationError::Validation(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "validation_error",
                    "message": msg
                }))
            }
            NotificationError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "notification_not_found",
                "message": "Notification not found"
            })),
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "An internal error occurred"
            })),
        }
    }
}
