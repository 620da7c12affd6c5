/// Redis integration
///
/// Only the connection wrapper lives here; the search cache built on top of
/// it is in [`crate::cache`].

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
