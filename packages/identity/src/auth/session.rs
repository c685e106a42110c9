//! # Session codec: store-backed opaque sessions
//!
//! The token handed to clients is the `tower-sessions` session cookie: an opaque
//! id whose record (holding the identity id) lives in the session store. Logout
//! deletes the record, so revocation is immediate; expiry is enforced by the
//! session store when the record is loaded.
//!
//! [`SessionCodec::verify`] re-checks that the identity still exists on every
//! call. Nothing is cached, so deleting an identity invalidates its sessions on
//! the very next request.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tower_sessions::{Expiry, Session};
use uuid::Uuid;

use crate::error::AuthError;
use crate::store::IdentityStore;

/// Key for storing the identity id in the session.
pub const SESSION_IDENTITY_KEY: &str = "identity_id";

/// Default session lifetime: 7 days.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

#[derive(Clone)]
pub struct SessionCodec {
    store: Arc<dyn IdentityStore>,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Bind `session` to `identity_id`, rotating its id first.
    pub async fn issue(&self, session: &Session, identity_id: Uuid) -> Result<(), AuthError> {
        session.cycle_id().await?;
        session.insert(SESSION_IDENTITY_KEY, identity_id).await?;

        let ttl = time::Duration::try_from(self.ttl)
            .map_err(|e| AuthError::Internal(format!("session ttl out of range: {e}")))?;
        session.set_expiry(Some(Expiry::AtDateTime(OffsetDateTime::now_utc() + ttl)));
        Ok(())
    }

    /// Resolve the identity bound to `session`.
    pub async fn verify(&self, session: &Session) -> Result<Uuid, AuthError> {
        let identity_id = match session.get::<Uuid>(SESSION_IDENTITY_KEY).await {
            Ok(Some(id)) => id,
            Ok(None) => return Err(AuthError::InvalidToken),
            // A record that does not decode is as good as no record.
            Err(tower_sessions::session::Error::SerdeJson(_)) => {
                return Err(AuthError::InvalidToken)
            }
            Err(e) => return Err(e.into()),
        };

        if !self.store.exists(identity_id).await? {
            tracing::debug!(identity = %identity_id, "session refers to a missing identity");
            return Err(AuthError::InvalidToken);
        }

        Ok(identity_id)
    }

    /// Destroy the session record and its cookie.
    pub async fn revoke(&self, session: &Session) -> Result<(), AuthError> {
        session.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewIdentity, Provider};
    use crate::store::MemoryIdentityStore;
    use tower_sessions::MemoryStore;

    fn fresh_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn seeded() -> (MemoryIdentityStore, SessionCodec, Uuid) {
        let store = MemoryIdentityStore::new();
        let identity = store
            .create_identity(NewIdentity::new("a@x.com", Provider::Github))
            .await
            .unwrap();
        let codec = SessionCodec::new(Arc::new(store.clone()));
        (store, codec, identity.id)
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let (_, codec, id) = seeded().await;
        let session = fresh_session();

        codec.issue(&session, id).await.unwrap();
        assert_eq!(codec.verify(&session).await.unwrap(), id);
        assert!(matches!(session.expiry(), Some(Expiry::AtDateTime(_))));
    }

    #[tokio::test]
    async fn test_empty_session_is_invalid() {
        let (_, codec, _) = seeded().await;
        let err = codec.verify(&fresh_session()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_malformed_session_value_is_invalid() {
        let (_, codec, _) = seeded().await;
        let session = fresh_session();
        session
            .insert(SESSION_IDENTITY_KEY, "not-a-uuid")
            .await
            .unwrap();

        let err = codec.verify(&session).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_deleted_identity_invalidates_session() {
        let (store, codec, id) = seeded().await;
        let session = fresh_session();
        codec.issue(&session, id).await.unwrap();
        assert!(codec.verify(&session).await.is_ok());

        store.remove(id).await;
        let err = codec.verify(&session).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_revoke() {
        let (_, codec, id) = seeded().await;
        let session = fresh_session();
        codec.issue(&session, id).await.unwrap();

        codec.revoke(&session).await.unwrap();
        assert!(matches!(
            codec.verify(&session).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
