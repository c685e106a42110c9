//! # Snapgram HTTP server
//!
//! Binds the identity subsystem to axum:
//!
//! - [`settings`]: layered configuration (defaults, `config.toml`, environment)
//! - [`routes`]: the authentication endpoints and the gated router
//! - [`application`]: wiring of the pool, stores, session layer and providers

pub mod application;
pub mod routes;
pub mod settings;

pub use application::launch;
pub use routes::{router, AppState, Redirects};
pub use settings::Settings;
