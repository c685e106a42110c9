//! # OAuth credential verifier (Discord, GitHub, Google)
//!
//! Turns a provider profile into an identity decision. One [`OAuthVerifier`] is
//! built per provider; the provider decides whether an unverified email blocks
//! registration ([`Provider::requires_verified_email`]).
//!
//! | Operation | Unknown email | Known email |
//! |-----------|---------------|-------------|
//! | [`login`](OAuthVerifier::login) | `IdentityNotFound` | succeed, linking the provider if it was not yet linked |
//! | [`register`](OAuthVerifier::register) | create identity (if the email is verified where required) | `DuplicateIdentity` |
//!
//! A profile without an email is rejected with `MissingProfileField` by both.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AuthError;
use crate::models::{NewIdentity, Provider};
use crate::providers::OAuthProfile;
use crate::store::IdentityStore;

#[derive(Clone)]
pub struct OAuthVerifier {
    provider: Provider,
    store: Arc<dyn IdentityStore>,
}

impl OAuthVerifier {
    pub fn new(provider: Provider, store: Arc<dyn IdentityStore>) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub async fn login(&self, profile: &OAuthProfile) -> Result<Uuid, AuthError> {
        let email = required_email(profile)?;

        let Some(identity) = self.store.find_by_email(email).await? else {
            return Err(AuthError::IdentityNotFound);
        };

        if !identity.linked.contains(self.provider) {
            // Linking is best effort; the login itself already succeeded.
            match self
                .store
                .update_linked_providers(identity.id, self.provider)
                .await
            {
                Ok(()) => tracing::info!(
                    identity = %identity.id,
                    provider = %self.provider,
                    "linked provider to existing identity"
                ),
                Err(e) => tracing::warn!(
                    identity = %identity.id,
                    provider = %self.provider,
                    "failed to link provider: {}",
                    e
                ),
            }
        }

        Ok(identity.id)
    }

    pub async fn register(&self, profile: &OAuthProfile) -> Result<Uuid, AuthError> {
        let email = required_email(profile)?;

        if self.provider.requires_verified_email() && profile.email_verified != Some(true) {
            return Err(AuthError::EmailUnverified);
        }

        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let mut new = NewIdentity::new(email, self.provider);
        new.display_name = non_blank(&profile.display_name);
        new.first_name = non_blank(&profile.first_name);
        new.last_name = non_blank(&profile.last_name);
        new.avatar_url = non_blank(&profile.avatar_url);

        let identity = self.store.create_identity(new).await?;
        tracing::info!(
            identity = %identity.id,
            provider = %self.provider,
            "registered identity from provider profile"
        );
        Ok(identity.id)
    }
}

fn required_email(profile: &OAuthProfile) -> Result<&str, AuthError> {
    profile
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(AuthError::MissingProfileField("email"))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
