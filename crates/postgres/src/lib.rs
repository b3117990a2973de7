//! # Postgres
//!
//! This crate provides connection pooling and schema migrations for the
//! account and notification services.

/// Database client for the eBonder backend.
pub mod database;
