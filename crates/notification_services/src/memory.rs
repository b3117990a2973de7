use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::NotificationStore;
use crate::types::{NewNotification, Notification, NotificationError};

#[derive(Default)]
struct State {
    next_id: i32,
    notifications: BTreeMap<i32, Notification>,
}

/// A notification store kept in process memory. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryNotificationStore {
    state: RwLock<State>,
}

impl MemoryNotificationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn all(&self) -> Result<Vec<Notification>, NotificationError> {
        let state = self.state.read().await;
        Ok(state.notifications.values().cloned().collect())
    }

    async fn find(&self, id: i32) -> Result<Option<Notification>, NotificationError> {
        let state = self.state.read().await;
        Ok(state.notifications.get(&id).cloned())
    }

    async fn insert(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        let mut state = self.state.write().await;
        state.next_id += 1;

        let stored = Notification {
            id: state.next_id,
            title: notification.title,
            description: notification.description,
            created_at: notification.created_at,
            is_read: notification.is_read,
        };
        state.notifications.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn delete(&self, id: i32) -> Result<bool, NotificationError> {
        let mut state = self.state.write().await;
        Ok(state.notifications.remove(&id).is_some())
    }
}
