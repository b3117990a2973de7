//! # Account Services
//!
//! This crate provides account management for the application: registration,
//! password sign-in, role membership and session token issuance.

/// Password, lockout and token settings.
pub mod config;
/// Session token issuance and verification.
pub mod jwt;
/// In-process credential store.
pub mod memory;
/// Middleware for request authentication and user session management.
pub mod middleware;
/// Password policy enforcement and hashing.
pub mod password;
/// Account operations built on top of a credential store.
pub mod service;
/// Credential store contract and its PostgreSQL implementation.
pub mod store;
/// Types and structures used in account services.
pub mod types;

pub use config::{LockoutPolicy, PasswordPolicy, TokenConfig};
pub use jwt::TokenIssuer;
pub use memory::MemoryCredentialStore;
pub use service::AccountService;
pub use store::{CredentialStore, PgCredentialStore};
pub use types::*;
