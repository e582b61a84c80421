//! # Rollcall Shared Library
//!
//! Shared types and data access for the Rollcall attendance service.
//!
//! ## Module Organization
//!
//! - `models`: database models with their CRUD and report queries
//! - `auth`: password hashing, JWT tokens, request auth context, role checks
//! - `db`: connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
