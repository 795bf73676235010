//! # TeamTask Shared Library
//!
//! Domain types, storage and auth primitives used by the TeamTask API server.
//!
//! ## Module Organization
//!
//! - `models`: users, teams, tasks and their display forms
//! - `store`: the `Store` trait with PostgreSQL and in-memory backends
//! - `auth`: password hashing, session tokens, permission checks
//! - `db`: connection pool and migrations
//! - `validation`: field-level validation helpers

pub mod auth;
pub mod db;
pub mod models;
pub mod store;
pub mod validation;

/// Current version of the TeamTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
