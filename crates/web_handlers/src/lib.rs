//! # Web Handlers for the eBonder backend
//!
//! This crate provides the HTTP handlers and route table for accounts and notifications.

/// Account handlers (register, login, roles)
mod account_handlers;
pub use account_handlers::*;

/// Notification CRUD handlers
mod notification_handlers;
pub use notification_handlers::*;

/// Health handlers
mod admin_handlers;
pub use admin_handlers::*;

/// Route table shared by the server and the tests
mod routes;
pub use routes::*;
