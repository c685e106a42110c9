//! # Local (email + password) credential verifier
//!
//! Login and registration are separate operations with separate proofs. A login
//! proof never carries names, so a stray `firstName` on a login request can not
//! turn it into a registration.
//!
//! - [`LocalVerifier::login`] resolves the identity by email and checks the Argon2
//!   hash. An unknown email, an identity without a local password, an unusable
//!   stored hash and a wrong password all produce the same
//!   [`AuthError::InvalidCredentials`], after the same amount of hashing work.
//! - [`LocalVerifier::register`] validates input, hashes the password and creates
//!   the identity with only `local` linked. The store's uniqueness check decides
//!   duplicates; the lookup before hashing just skips needless Argon2 work.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::password::{check_login_password, hash_password, PasswordPolicy};
use crate::error::AuthError;
use crate::models::{is_valid_email, normalize_email, NewIdentity, Provider};
use crate::store::IdentityStore;

/// Proof for a local login.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalLogin {
    pub email: String,
    pub password: String,
}

/// Proof for a local registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRegistration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone)]
pub struct LocalVerifier {
    store: Arc<dyn IdentityStore>,
    policy: PasswordPolicy,
}

impl LocalVerifier {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            policy: PasswordPolicy::default(),
        }
    }

    pub async fn login(&self, proof: &LocalLogin) -> Result<Uuid, AuthError> {
        let identity = self.store.find_by_email(&proof.email).await?;
        let stored = identity
            .as_ref()
            .and_then(|identity| identity.password_hash.as_deref());

        let matched = check_login_password(&proof.password, stored);

        match identity {
            Some(identity) if matched => Ok(identity.id),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    pub async fn register(&self, proof: &LocalRegistration) -> Result<Uuid, AuthError> {
        let email = normalize_email(&proof.email);
        let first_name = proof.first_name.trim();
        let last_name = proof.last_name.trim();

        if !is_valid_email(&email) {
            return Err(AuthError::InvalidInput("Invalid email address".to_string()));
        }
        self.policy.check(&proof.password)?;
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AuthError::InvalidInput(
                "First and last name are required".to_string(),
            ));
        }

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let mut new = NewIdentity::new(&email, Provider::Local);
        new.first_name = Some(first_name.to_string());
        new.last_name = Some(last_name.to_string());
        new.password_hash = Some(hash_password(&proof.password)?);

        let identity = self.store.create_identity(new).await?;
        tracing::info!(identity = %identity.id, "registered local identity");
        Ok(identity.id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::store::MemoryIdentityStore;

    fn registration(email: &str, password: &str) -> LocalRegistration {
        LocalRegistration {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    fn login(email: &str, password: &str) -> LocalLogin {
        LocalLogin {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryIdentityStore::new();
        let verifier = LocalVerifier::new(Arc::new(store.clone()));

        let id = verifier
            .register(&registration("a@x.com", "secret"))
            .await
            .unwrap();
        let identity = store.get_by_id(id).await.unwrap().unwrap();
        assert!(identity.linked.local);
        assert!(!identity.linked.google);
        assert_eq!(identity.first_name.as_deref(), Some("A"));
        assert_ne!(identity.password_hash.as_deref(), Some("secret"));

        let err = verifier.login(&login("a@x.com", "wrong")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let logged_in = verifier.login(&login("a@x.com", "secret")).await.unwrap();
        assert_eq!(logged_in, id);
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let verifier = LocalVerifier::new(Arc::new(MemoryIdentityStore::new()));
        let err = verifier
            .login(&login("nobody@x.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_oauth_only_identity_has_no_password() {
        let store = MemoryIdentityStore::new();
        store
            .create_identity(NewIdentity::new("a@x.com", Provider::Github))
            .await
            .unwrap();
        let verifier = LocalVerifier::new(Arc::new(store));

        let err = verifier.login(&login("a@x.com", "secret")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unusable_stored_hash_is_invalid_credentials() {
        let store = MemoryIdentityStore::new();
        let mut new = NewIdentity::new("a@x.com", Provider::Local);
        new.password_hash = Some("not-a-phc-string".to_string());
        store.create_identity(new).await.unwrap();
        let verifier = LocalVerifier::new(Arc::new(store));

        let err = verifier.login(&login("a@x.com", "secret")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_hash_check() {
        let verifier = LocalVerifier::new(Arc::new(MemoryIdentityStore::new()));
        verifier
            .register(&registration("a@x.com", "secret"))
            .await
            .unwrap();

        let mut known = Duration::ZERO;
        let mut unknown = Duration::ZERO;
        for _ in 0..3 {
            let start = Instant::now();
            let _ = verifier.login(&login("a@x.com", "wrong")).await;
            known += start.elapsed();

            let start = Instant::now();
            let _ = verifier.login(&login("nobody@x.com", "wrong")).await;
            unknown += start.elapsed();
        }
        // Both paths run Argon2; without the dummy check the gap is several hundredfold.
        assert!(unknown * 5 > known, "known {known:?}, unknown {unknown:?}");
    }

    #[tokio::test]
    async fn test_register_twice_is_duplicate() {
        let verifier = LocalVerifier::new(Arc::new(MemoryIdentityStore::new()));
        verifier
            .register(&registration("a@x.com", "secret"))
            .await
            .unwrap();

        let err = verifier
            .register(&registration("A@x.com", "another"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_register_over_oauth_identity_is_duplicate() {
        let store = MemoryIdentityStore::new();
        store
            .create_identity(NewIdentity::new("a@x.com", Provider::Discord))
            .await
            .unwrap();
        let verifier = LocalVerifier::new(Arc::new(store));

        let err = verifier
            .register(&registration("a@x.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_register_single_winner() {
        let store = MemoryIdentityStore::new();
        let verifier = LocalVerifier::new(Arc::new(store.clone()));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let verifier = verifier.clone();
                tokio::spawn(async move {
                    verifier.register(&registration("race@x.com", "secret")).await
                })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AuthError::DuplicateIdentity) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((successes, duplicates), (1, 1));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let store = MemoryIdentityStore::new();
        let verifier = LocalVerifier::new(Arc::new(store.clone()));

        for proof in [
            registration("not-an-email", "secret"),
            registration("a@x.com", "abc"),
            LocalRegistration {
                first_name: "  ".to_string(),
                ..registration("a@x.com", "secret")
            },
        ] {
            let err = verifier.register(&proof).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidInput(_)), "{err}");
        }
        assert!(store.is_empty().await);
    }
}
