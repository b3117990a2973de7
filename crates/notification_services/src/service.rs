use std::sync::Arc;

use chrono::Utc;

use crate::store::NotificationStore;
use crate::types::{NewNotification, NotificationCreateDto, NotificationError, NotificationReadDto};

/// Service for notification CRUD operations
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    /// Creates a new instance of `NotificationService` over the given store
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Fetches all notifications, ordered by id
    pub async fn find_all(&self) -> Result<Vec<NotificationReadDto>, NotificationError> {
        let notifications = self.store.all().await?;
        Ok(notifications.into_iter().map(NotificationReadDto::from).collect())
    }

    /// Fetches a single notification
    pub async fn find_one(&self, id: i32) -> Result<Option<NotificationReadDto>, NotificationError> {
        Ok(self.store.find(id).await?.map(NotificationReadDto::from))
    }

    /// Creates an unread notification stamped with the current time
    pub async fn create(
        &self,
        dto: &NotificationCreateDto,
    ) -> Result<NotificationReadDto, NotificationError> {
        let notification = self
            .store
            .insert(NewNotification {
                title: dto.title.clone(),
                description: dto.description.clone(),
                created_at: Utc::now(),
                is_read: false,
            })
            .await?;

        log::info!("Created notification {}", notification.id);
        Ok(notification.into())
    }

    /// Deletes a notification, returning false if it did not exist
    pub async fn delete(&self, id: i32) -> Result<bool, NotificationError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            log::info!("Deleted notification {}", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryNotificationStore;

    fn service() -> NotificationService {
        NotificationService::new(Arc::new(MemoryNotificationStore::new()))
    }

    fn dto(title: &str, description: &str) -> NotificationCreateDto {
        NotificationCreateDto {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find_all() {
        let service = service();

        let before = Utc::now();
        let created = service.create(&dto("T", "D")).await.unwrap();
        let after = Utc::now();

        let all = service.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        let entry = &all[0];
        assert_eq!(entry.id, created.id);
        assert_eq!(entry.title, "T");
        assert_eq!(entry.description, "D");
        assert!(!entry.is_read);
        assert!(entry.created_at >= before && entry.created_at <= after);
    }

    #[tokio::test]
    async fn test_find_all_is_ordered_by_id() {
        let service = service();
        for title in ["first", "second", "third"] {
            service.create(&dto(title, "body")).await.unwrap();
        }
        service.delete(2).await.unwrap();
        service.create(&dto("fourth", "body")).await.unwrap();

        let ids: Vec<i32> = service
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[tokio::test]
    async fn test_delete_existing_and_missing() {
        let service = service();
        let created = service.create(&dto("T", "D")).await.unwrap();

        assert_eq!(service.find_one(created.id).await.unwrap(), Some(created.clone()));
        assert!(service.delete(created.id).await.unwrap());
        assert!(service.find_one(created.id).await.unwrap().is_none());
        assert!(!service.delete(created.id).await.unwrap());
        assert!(!service.delete(999).await.unwrap());
    }

    #[test]
    fn test_create_dto_validation() {
        use validator::Validate;

        assert!(dto("T", "D").validate().is_ok());
        assert!(dto("", "D").validate().is_err());
        assert!(dto("T", "").validate().is_err());
    }
}
