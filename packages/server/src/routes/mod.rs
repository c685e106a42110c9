//! # Routes
//!
//! [`router`] assembles every endpoint behind the [`route_gate`] middleware.
//! The session layer is not part of the router; the caller installs it outside
//! so the gate and the handlers share one [`tower_sessions::Session`].
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/` | [`health::root`] |
//! | GET | `/health` | [`health::health`] |
//! | POST | `/auth/local/login` | [`local::login`] |
//! | POST | `/auth/local/register` | [`local::register`] |
//! | GET | `/auth/{provider}/{flow}` | [`oauth::authorize`] |
//! | GET | `/auth/{provider}/{flow}/callback` | [`oauth::callback`] |
//! | POST | `/auth/logout` | [`session::logout`] |
//! | GET | `/auth/me` | [`session::me`] |
//! | PUT | `/auth/me` | [`session::update_me`] |

pub mod health;
pub mod local;
pub mod oauth;
pub mod session;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use identity::auth::{route_gate, LocalVerifier, RouteGate, SessionCodec, Whitelist};
use identity::providers::ProviderRegistry;
use identity::store::IdentityStore;
use identity::AuthError;

/// Prefixes reachable without a session.
pub const WHITELIST: &[&str] = &[
    "/health",
    "/auth/local",
    "/auth/discord",
    "/auth/github",
    "/auth/google",
];

/// Where browser flows land after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirects {
    pub success: String,
    pub failure: String,
}

impl Redirects {
    /// Failure URL carrying the error code, e.g. `.../failure?error=email_unverified`.
    pub fn failure_for(&self, error: &AuthError) -> String {
        let separator = if self.failure.contains('?') { '&' } else { '?' };
        format!("{}{}error={}", self.failure, separator, error.code())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IdentityStore>,
    pub local: LocalVerifier,
    pub codec: SessionCodec,
    pub gate: RouteGate,
    pub providers: Arc<ProviderRegistry>,
    pub redirects: Arc<Redirects>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        codec: SessionCodec,
        providers: ProviderRegistry,
        redirects: Redirects,
    ) -> Self {
        Self {
            local: LocalVerifier::new(store.clone()),
            gate: RouteGate::new(Whitelist::new(WHITELIST), codec.clone()),
            store,
            codec,
            providers: Arc::new(providers),
            redirects: Arc::new(redirects),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let gate = state.gate.clone();

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/auth/local/login", post(local::login))
        .route("/auth/local/register", post(local::register))
        .route("/auth/logout", post(session::logout))
        .route("/auth/me", get(session::me).put(session::update_me))
        .route("/auth/{provider}/{flow}", get(oauth::authorize))
        .route("/auth/{provider}/{flow}/callback", get(oauth::callback))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(gate, route_gate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_redirect_appends_code() {
        let redirects = Redirects {
            success: "http://app/ok".to_string(),
            failure: "http://app/failed".to_string(),
        };
        assert_eq!(
            redirects.failure_for(&AuthError::EmailUnverified),
            "http://app/failed?error=email_unverified"
        );

        let with_query = Redirects {
            failure: "http://app/failed?from=oauth".to_string(),
            ..redirects
        };
        assert_eq!(
            with_query.failure_for(&AuthError::DuplicateIdentity),
            "http://app/failed?from=oauth&error=duplicate_identity"
        );
    }

    #[test]
    fn test_whitelist_keeps_session_routes_protected() {
        let whitelist = Whitelist::new(WHITELIST);
        assert!(whitelist.is_whitelisted("/auth/google/register/callback"));
        assert!(!whitelist.is_whitelisted("/auth/me"));
        assert!(!whitelist.is_whitelisted("/auth/logout"));
    }
}
