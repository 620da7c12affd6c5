/// HTTP route handlers
///
/// - `health`: liveness and dependency status
/// - `auth`: registration and login
/// - `tasks`: task CRUD, filtered listing, search and search history

pub mod auth;
pub mod health;
pub mod tasks;
