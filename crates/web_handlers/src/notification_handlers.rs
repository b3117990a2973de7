use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use notification_services::service::NotificationService;
use notification_services::types::*;

/// Lists every notification, ordered by id.
pub async fn list_notifications(
    notifications: web::Data<NotificationService>,
) -> Result<HttpResponse, NotificationError> {
    let all = notifications.find_all().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// Returns a single notification, or 404 if it does not exist.
pub async fn get_notification(
    notifications: web::Data<NotificationService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, NotificationError> {
    let notification = notifications
        .find_one(path.into_inner())
        .await?
        .ok_or(NotificationError::NotFound)?;

    Ok(HttpResponse::Ok().json(notification))
}

/// Creates an unread notification and returns it with its new id.
pub async fn create_notification(
    notifications: web::Data<NotificationService>,
    request: web::Json<NotificationCreateDto>,
) -> Result<HttpResponse, NotificationError> {
    request
        .validate()
        .map_err(|e| NotificationError::Validation(format!("Validation error: {}", e)))?;

    let created = notifications.create(&request).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Deletes a notification. Returns 204, or 404 if nothing was removed.
pub async fn delete_notification(
    notifications: web::Data<NotificationService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, NotificationError> {
    if notifications.delete(path.into_inner()).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(NotificationError::NotFound)
    }
}
