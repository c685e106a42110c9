//! # Database module: PostgreSQL connection pool and migrations
//!
//! The pool is created once at startup by the server and handed to
//! [`PgIdentityStore`](crate::store::PgIdentityStore) and the session store, rather
//! than living in a process-wide singleton.
//!
//! ## Re-exports
//!
//! - [`connect`]: opens a pool against a connection URL.
//! - [`migrate`]: applies the embedded `migrations/` to that pool.

mod pool;

pub use pool::{connect, migrate};
