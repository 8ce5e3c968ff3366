//! # Taskboard Shared Library
//!
//! This crate contains the types and business logic shared by the taskboard
//! API server and supporting tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, JWT tokens, and membership authorization
//! - `license`: License key generation and format validation
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod license;
pub mod models;

/// Current version of the taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
