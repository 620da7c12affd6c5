//! # TaskPro API Server Library
//!
//! HTTP surface of TaskPro: accounts, owner-scoped task CRUD and a
//! cache-backed task search with per-user history.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
