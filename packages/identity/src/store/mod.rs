//! # Identity Store: persistence boundary for identities
//!
//! [`IdentityStore`] is the only way the verifiers, the session codec and the
//! route gate touch persisted identities. Two implementations live in sibling
//! modules:
//!
//! | Store | Backing | Used by |
//! |-------|---------|---------|
//! | [`PgIdentityStore`] | PostgreSQL `users` table (sqlx) | the server binary |
//! | [`MemoryIdentityStore`] | `HashMap` behind a `tokio::sync::Mutex` | tests, local tooling |
//!
//! ## Uniqueness
//!
//! Email uniqueness is enforced by the store itself (a unique index in Postgres,
//! a check-and-insert under one lock in memory). [`create_identity`](IdentityStore::create_identity)
//! reports a collision as [`StoreError::DuplicateEmail`]; callers treat that as the
//! authoritative duplicate signal, any pre-check they do is only a shortcut.
//!
//! ## Atomicity
//!
//! Creation writes the row together with its originating provider flag in a
//! single statement, so a half-created identity with no linked provider is never
//! observable, even if the request future is dropped mid-flight.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Identity, NewIdentity, ProfileUpdate, Provider};

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already belongs to an identity")]
    DuplicateEmail,
    #[error("invalid identity: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Async persistence interface for identities.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by (normalised) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Persist a new identity with its originating provider linked.
    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, StoreError>;

    /// Mark `provider` as linked for an existing identity. Idempotent.
    async fn update_linked_providers(&self, id: Uuid, provider: Provider)
        -> Result<(), StoreError>;

    /// Overwrite the profile fields present in `update`. Credentials and linked
    /// providers are never touched. `None` when the identity does not exist.
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Identity>, StoreError>;

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;
}
