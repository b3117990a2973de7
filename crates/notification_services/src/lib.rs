//! # Notification Services
//!
//! This crate provides the notification resource: listing, fetching,
//! creating and deleting notifications stored in a relational table.

/// In-process notification store.
pub mod memory;
/// Notification operations with DTO translation.
pub mod service;
/// Notification store contract and its PostgreSQL implementation.
pub mod store;
/// Types and structures used in notification services.
pub mod types;

pub use memory::MemoryNotificationStore;
pub use service::NotificationService;
pub use store::{NotificationStore, PgNotificationStore};
pub use types::{
    NewNotification, Notification, NotificationCreateDto, NotificationError, NotificationReadDto,
};
