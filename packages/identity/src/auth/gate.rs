//! # Route gate: whitelist check and identity resolution per request
//!
//! [`Whitelist`] is an immutable value built once at startup. [`RouteGate`]
//! combines it with the [`SessionCodec`] and runs as axum middleware via
//! [`route_gate`]:
//!
//! 1. `/` and whitelisted paths pass straight through, no session lookup.
//! 2. Everything else must carry a session that the codec verifies; the resolved
//!    [`CurrentIdentity`] is inserted into the request extensions.
//! 3. Any verification failure answers `401` and the handler never runs.
//!
//! ## Prefix semantics
//!
//! An entry matches a path when the path equals it or continues it at a `/`
//! boundary: `/health` admits `/health` and `/health/live` but not
//! `/healthcheck`, and `/auth` never exposes `/authadmin`. Matching is
//! case-sensitive and ignores the query string. An entry that itself ends in
//! `/` admits everything beneath it.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_sessions::Session;
use uuid::Uuid;

use super::session::SessionCodec;
use crate::error::AuthError;

/// Route prefixes that bypass authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    prefixes: Vec<String>,
}

impl Whitelist {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| normalize_prefix(p.as_ref()))
                .collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_whitelisted(&self, path: &str) -> bool {
        path == "/" || self.prefixes.iter().any(|prefix| matches_prefix(prefix, path))
    }
}

fn normalize_prefix(prefix: &str) -> String {
    if prefix.starts_with('/') {
        prefix.to_string()
    } else {
        format!("/{prefix}")
    }
}

fn matches_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// The identity attached to an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentIdentity(pub Uuid);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentIdentity>()
            .copied()
            .ok_or(AuthError::InvalidToken)
    }
}

#[derive(Clone)]
pub struct RouteGate {
    whitelist: Arc<Whitelist>,
    codec: SessionCodec,
}

impl RouteGate {
    pub fn new(whitelist: Whitelist, codec: SessionCodec) -> Self {
        Self {
            whitelist: Arc::new(whitelist),
            codec,
        }
    }

    /// Decide one request: `Ok(None)` lets a whitelisted path through untouched,
    /// `Ok(Some(id))` is an authenticated caller.
    pub async fn check(
        &self,
        path: &str,
        session: &Session,
    ) -> Result<Option<CurrentIdentity>, AuthError> {
        if self.whitelist.is_whitelisted(path) {
            return Ok(None);
        }
        let id = self.codec.verify(session).await?;
        Ok(Some(CurrentIdentity(id)))
    }
}

/// Middleware entry point; install with `axum::middleware::from_fn_with_state`.
pub async fn route_gate(
    State(gate): State<RouteGate>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match gate.check(&path, &session).await {
        Ok(Some(identity)) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => {
            tracing::debug!(path = %path, "rejected request: {}", e);
            match e {
                AuthError::Store(_) | AuthError::Session(_) => e.into_response(),
                _ => AuthError::InvalidToken.into_response(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewIdentity, Provider};
    use crate::store::{IdentityStore, MemoryIdentityStore};
    use tower_sessions::MemoryStore;

    #[test]
    fn test_prefix_is_normalised() {
        let whitelist = Whitelist::new(["health", "/auth/local"]);
        assert_eq!(whitelist.prefixes(), ["/health", "/auth/local"]);
    }

    #[test]
    fn test_root_always_whitelisted() {
        let whitelist = Whitelist::default();
        assert!(whitelist.is_whitelisted("/"));
        assert!(!whitelist.is_whitelisted("/images"));
    }

    #[test]
    fn test_prefix_matches_on_segment_boundary() {
        let whitelist = Whitelist::new(["/health"]);
        assert!(whitelist.is_whitelisted("/health"));
        assert!(whitelist.is_whitelisted("/health/sub"));
        assert!(!whitelist.is_whitelisted("/healthcheck"));
        assert!(!whitelist.is_whitelisted("/Health"));
        assert!(!whitelist.is_whitelisted("/api/health"));
    }

    #[test]
    fn test_auth_prefix_does_not_expose_lookalikes() {
        let whitelist = Whitelist::new(["/auth"]);
        assert!(whitelist.is_whitelisted("/auth/google/login"));
        assert!(!whitelist.is_whitelisted("/authadmin"));
        assert!(!whitelist.is_whitelisted("/authxyz"));
    }

    #[test]
    fn test_trailing_slash_entry_admits_subtree() {
        let whitelist = Whitelist::new(["/public/"]);
        assert!(whitelist.is_whitelisted("/public/a.png"));
        assert!(!whitelist.is_whitelisted("/public"));
    }

    #[tokio::test]
    async fn test_check_resolves_identity() {
        let store = MemoryIdentityStore::new();
        let identity = store
            .create_identity(NewIdentity::new("a@x.com", Provider::Google))
            .await
            .unwrap();
        let codec = SessionCodec::new(Arc::new(store));
        let gate = RouteGate::new(Whitelist::new(["/health"]), codec.clone());

        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(matches!(
            gate.check("/images", &session).await,
            Err(AuthError::InvalidToken)
        ));
        assert_eq!(gate.check("/health", &session).await.unwrap(), None);

        codec.issue(&session, identity.id).await.unwrap();
        assert_eq!(
            gate.check("/images", &session).await.unwrap(),
            Some(CurrentIdentity(identity.id))
        );
    }
}
