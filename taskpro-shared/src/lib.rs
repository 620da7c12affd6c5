//! # TaskPro Shared Library
//!
//! Domain types and services used by the TaskPro API server.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks and tags with their owner-scoped queries
//! - `db`: connection pool and embedded migrations
//! - `auth`: password hashing, JWTs and the request auth context
//! - `redis`: Redis connection wrapper
//! - `cache`: search cache backends (Redis, in-memory, disabled)
//! - `store`: the task lookup trait the search path depends on
//! - `search`: cache-backed search with per-user history

pub mod auth;
pub mod cache;
pub mod db;
pub mod models;
pub mod redis;
pub mod search;
pub mod store;

/// Current version of the TaskPro shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
