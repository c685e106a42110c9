//! # OAuth providers: clients, profiles and the provider registry
//!
//! Each third-party provider contributes two things: an [`OAuthClient`] that
//! runs the authorization-code exchange and fetches a normalised
//! [`OAuthProfile`], and an [`OAuthVerifier`] that turns that profile into an
//! identity decision. [`ProviderRegistry`] pairs them per [`Provider`] and is
//! built once at startup, then passed to the HTTP layer.
//!
//! ## Flow
//!
//! 1. [`OAuthClient::authorize`] produces the provider URL plus a CSRF state and a
//!    PKCE verifier. The caller keeps both in the user's session as a
//!    [`PendingAuthorization`].
//! 2. The provider redirects back to `/auth/{provider}/{flow}/callback`. The
//!    caller checks the returned state against the pending one and hands the code
//!    and verifier to [`OAuthClient::exchange_code`].
//!
//! Login and registration use distinct redirect URIs ([`Flow`]), so the
//! callback always knows which operation the user asked for.

mod client;
mod config;
mod discord;
mod github;
mod google;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::OAuthVerifier;
use crate::error::AuthError;
use crate::models::Provider;
use crate::store::IdentityStore;

pub use client::ProviderClient;
pub use config::OAuthConfig;

/// Key for the in-flight authorization in the session.
pub const SESSION_PENDING_AUTH_KEY: &str = "oauth_pending";

/// Which operation an OAuth round trip completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Login,
    Register,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Login => "login",
            Flow::Register => "register",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Flow::Login),
            "register" => Ok(Flow::Register),
            other => Err(AuthError::InvalidInput(format!("unknown flow: {other}"))),
        }
    }
}

/// Provider profile normalised across Discord, GitHub and Google.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider_user_id: String,
    pub email: Option<String>,
    /// `None` when the provider gives no verification signal.
    pub email_verified: Option<bool>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Where to send the user, plus the secrets to keep until the callback.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Authorization started by this session and not yet completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub provider: Provider,
    pub flow: Flow,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

impl PendingAuthorization {
    /// Confirm a callback belongs to this authorization.
    pub fn check(&self, provider: Provider, flow: Flow, state: &str) -> Result<(), AuthError> {
        if self.provider != provider || self.flow != flow {
            return Err(AuthError::Provider(
                "callback does not match the pending authorization".to_string(),
            ));
        }
        if self.csrf_state != state {
            return Err(AuthError::Provider("OAuth state mismatch".to_string()));
        }
        Ok(())
    }
}

/// Authorization-code client for one provider.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn authorize(&self, flow: Flow) -> AuthorizationRequest;

    /// Exchange `code` for an access token and fetch the user's profile.
    async fn exchange_code(
        &self,
        flow: Flow,
        code: &str,
        pkce_verifier: String,
    ) -> Result<OAuthProfile, AuthError>;
}

/// A configured provider: its client and its verifier.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub client: Arc<dyn OAuthClient>,
    pub verifier: OAuthVerifier,
}

/// OAuth providers available to the HTTP layer.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `client`, pairing it with a verifier over `store`.
    pub fn register(
        &mut self,
        client: Arc<dyn OAuthClient>,
        store: Arc<dyn IdentityStore>,
    ) -> Result<(), AuthError> {
        let provider = client.provider();
        if provider == Provider::Local {
            return Err(AuthError::Configuration(
                "the local provider has no OAuth client".to_string(),
            ));
        }
        let verifier = OAuthVerifier::new(provider, store);
        self.providers
            .insert(provider, RegisteredProvider { client, verifier });
        Ok(())
    }

    pub fn with(
        mut self,
        client: Arc<dyn OAuthClient>,
        store: Arc<dyn IdentityStore>,
    ) -> Result<Self, AuthError> {
        self.register(client, store)?;
        Ok(self)
    }

    pub fn get(&self, provider: Provider) -> Option<&RegisteredProvider> {
        self.providers.get(&provider)
    }

    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.providers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryIdentityStore;

    struct NoopClient(Provider);

    #[async_trait]
    impl OAuthClient for NoopClient {
        fn provider(&self) -> Provider {
            self.0
        }

        fn authorize(&self, _flow: Flow) -> AuthorizationRequest {
            AuthorizationRequest {
                url: "https://provider.test/authorize".to_string(),
                csrf_state: "state".to_string(),
                pkce_verifier: "verifier".to_string(),
            }
        }

        async fn exchange_code(
            &self,
            _flow: Flow,
            _code: &str,
            _pkce_verifier: String,
        ) -> Result<OAuthProfile, AuthError> {
            Ok(OAuthProfile::default())
        }
    }

    #[test]
    fn test_registry_pairs_client_and_verifier() {
        let store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());
        let registry = ProviderRegistry::new()
            .with(Arc::new(NoopClient(Provider::Discord)), store.clone())
            .unwrap();

        let discord = registry.get(Provider::Discord).unwrap();
        assert_eq!(discord.verifier.provider(), Provider::Discord);
        assert!(registry.get(Provider::Google).is_none());

        let err = ProviderRegistry::new()
            .with(Arc::new(NoopClient(Provider::Local)), store)
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_pending_authorization_check() {
        let pending = PendingAuthorization {
            provider: Provider::Google,
            flow: Flow::Register,
            csrf_state: "abc".to_string(),
            pkce_verifier: "v".to_string(),
        };
        assert!(pending.check(Provider::Google, Flow::Register, "abc").is_ok());
        assert!(pending.check(Provider::Google, Flow::Register, "abd").is_err());
        assert!(pending.check(Provider::Google, Flow::Login, "abc").is_err());
        assert!(pending.check(Provider::Github, Flow::Register, "abc").is_err());
    }

    #[test]
    fn test_flow_parse() {
        assert_eq!("login".parse::<Flow>().unwrap(), Flow::Login);
        assert_eq!("register".parse::<Flow>().unwrap(), Flow::Register);
        assert!("logout".parse::<Flow>().is_err());
    }
}
