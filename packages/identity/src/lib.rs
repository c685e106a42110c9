//! # Identity crate: authentication and identity resolution for Snapgram
//!
//! Unifies four credential sources (local password, Discord, GitHub, Google)
//! into one identity per email, issues sessions for authenticated identities,
//! and gates every inbound request on a route whitelist.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `Identity` record, its client-safe projection `IdentityInfo`, `Provider`, creation payload and validation |
//! | [`store`] | `IdentityStore` trait with PostgreSQL and in-memory implementations |
//! | [`auth`] | Local and OAuth verifiers, Argon2 password hashing, session codec, route gate middleware |
//! | [`providers`] | OAuth authorization-code clients for Discord, GitHub and Google, and the provider registry |
//! | [`db`] | PostgreSQL pool creation and embedded migrations |
//! | [`error`] | `AuthError`, the error taxonomy every operation returns |
//!
//! ## Request flow
//!
//! ```text
//! request ─► route_gate ─► whitelisted? ──yes──► handler
//!                              │ no
//!                              ▼
//!                   SessionCodec::verify ──ok──► handler (CurrentIdentity attached)
//!                              │ err
//!                              ▼
//!                             401
//! ```
//!
//! Login and registration endpoints call a verifier, which reads and writes the
//! `IdentityStore`, then [`SessionCodec::issue`](auth::SessionCodec::issue) binds
//! the caller's session to the resolved identity.

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod providers;
pub mod store;

pub use error::AuthError;
pub use models::{Identity, IdentityInfo, Provider};
