//! # Identity model: one record per person, keyed by email
//!
//! Defines the two representations of a Snapgram identity, mirroring the
//! row/projection split used throughout the crate:
//!
//! ## [`Identity`]
//!
//! The complete `users` row. It derives [`sqlx::FromRow`] so it can be loaded
//! directly from queries:
//!
//! - `id`: primary key (`UUID v4`), assigned by the store, never changes.
//! - `email`: unique, lower-cased; the join key across every provider.
//! - `display_name`, `first_name`, `last_name`, `avatar_url`: profile fields
//!   filled by whichever provider created the identity (first writer wins).
//! - `password_hash`: Argon2 PHC string, present only once the local provider
//!   registered this email.
//! - `linked`: which [`Provider`]s have authenticated this email at least once.
//! - `created_at` / `updated_at`: audit timestamps.
//!
//! ## [`IdentityInfo`]
//!
//! The outward projection returned by the HTTP layer. It omits the password hash
//! and converts the `Uuid` to a `String`.
//!
//! ## [`NewIdentity`]
//!
//! The creation payload handed to an [`IdentityStore`](crate::store::IdentityStore).
//! It always names exactly one originating provider, so a freshly created identity
//! can never be unreachable. [`NewIdentity::validate`] is the entity validation
//! function both store implementations run before writing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An authentication source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Discord,
    Github,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Local,
        Provider::Discord,
        Provider::Github,
        Provider::Google,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Discord => "discord",
            Provider::Github => "github",
            Provider::Google => "google",
        }
    }

    /// Whether registration through this provider demands a verified email.
    ///
    /// GitHub exposes no such signal on its profile, so it is accepted as-is.
    pub fn requires_verified_email(&self) -> bool {
        matches!(self, Provider::Discord | Provider::Google)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Provider::Local),
            "discord" => Ok(Provider::Discord),
            "github" => Ok(Provider::Github),
            "google" => Ok(Provider::Google),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Which providers have successfully authenticated an identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LinkedProviders {
    #[sqlx(rename = "linked_local")]
    pub local: bool,
    #[sqlx(rename = "linked_discord")]
    pub discord: bool,
    #[sqlx(rename = "linked_github")]
    pub github: bool,
    #[sqlx(rename = "linked_google")]
    pub google: bool,
}

impl LinkedProviders {
    pub fn only(provider: Provider) -> Self {
        let mut linked = Self::default();
        linked.link(provider);
        linked
    }

    pub fn link(&mut self, provider: Provider) {
        match provider {
            Provider::Local => self.local = true,
            Provider::Discord => self.discord = true,
            Provider::Github => self.github = true,
            Provider::Google => self.google = true,
        }
    }

    pub fn contains(&self, provider: Provider) -> bool {
        match provider {
            Provider::Local => self.local,
            Provider::Discord => self.discord,
            Provider::Github => self.github,
            Provider::Google => self.google,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.local || self.discord || self.github || self.google)
    }

    pub fn iter(&self) -> impl Iterator<Item = Provider> + '_ {
        Provider::ALL.into_iter().filter(|p| self.contains(*p))
    }
}

/// Full identity record from the store.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
    #[sqlx(flatten)]
    pub linked: LinkedProviders,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Convert to IdentityInfo for client consumption.
    pub fn to_info(&self) -> IdentityInfo {
        IdentityInfo {
            id: self.id.to_string(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar_url: self.avatar_url.clone(),
            providers: self.linked.iter().collect(),
        }
    }
}

/// Identity information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityInfo {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub providers: Vec<Provider>,
}

/// Fields for a not-yet-persisted identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
    pub provider: Provider,
}

impl NewIdentity {
    pub fn new(email: &str, provider: Provider) -> Self {
        Self {
            email: normalize_email(email),
            display_name: None,
            first_name: None,
            last_name: None,
            avatar_url: None,
            password_hash: None,
            provider,
        }
    }

    /// Check the invariants every persisted identity must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_email(&self.email) {
            return Err(format!("invalid email: {}", self.email));
        }
        if self.email != normalize_email(&self.email) {
            return Err("email must be normalised".to_string());
        }
        validate_profile_fields(
            &self.display_name,
            &self.first_name,
            &self.last_name,
            &self.avatar_url,
        )?;
        if self.provider == Provider::Local && self.password_hash.is_none() {
            return Err("local identities need a password hash".to_string());
        }
        Ok(())
    }
}

/// Profile fields a signed-in identity may change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Same field rules as [`NewIdentity::validate`].
    pub fn validate(&self) -> Result<(), String> {
        validate_profile_fields(
            &self.display_name,
            &self.first_name,
            &self.last_name,
            &self.avatar_url,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.avatar_url.is_none()
    }

    /// Write the present fields onto `identity`.
    pub fn apply(self, identity: &mut Identity) {
        if let Some(v) = self.display_name {
            identity.display_name = Some(v);
        }
        if let Some(v) = self.first_name {
            identity.first_name = Some(v);
        }
        if let Some(v) = self.last_name {
            identity.last_name = Some(v);
        }
        if let Some(v) = self.avatar_url {
            identity.avatar_url = Some(v);
        }
    }
}

/// Optional profile fields must not be blank when present.
fn validate_profile_fields(
    display_name: &Option<String>,
    first_name: &Option<String>,
    last_name: &Option<String>,
    avatar_url: &Option<String>,
) -> Result<(), String> {
    for (field, value) in [
        ("displayName", display_name),
        ("firstName", first_name),
        ("lastName", last_name),
        ("avatarUrl", avatar_url),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(format!("{field} must not be empty"));
        }
    }
    Ok(())
}

/// Trim and lower-case an email so every lookup hits the same key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose syntactic email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2 && !domain.contains(".."),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x..com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_new_identity_normalises_email() {
        let new = NewIdentity::new("  Someone@Example.COM ", Provider::Github);
        assert_eq!(new.email, "someone@example.com");
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_local_identity_requires_hash() {
        let new = NewIdentity::new("a@x.com", Provider::Local);
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_blank_profile_field_rejected() {
        let mut new = NewIdentity::new("a@x.com", Provider::Google);
        new.display_name = Some("   ".to_string());
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_profile_update_rules() {
        let blank = ProfileUpdate {
            last_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.validate().unwrap_err(), "lastName must not be empty");
        assert!(ProfileUpdate::default().is_empty());

        let update = ProfileUpdate {
            display_name: Some("Ada".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_linked_providers() {
        let mut linked = LinkedProviders::only(Provider::Discord);
        assert!(!linked.is_empty());
        assert!(linked.contains(Provider::Discord));
        assert!(!linked.contains(Provider::Local));

        linked.link(Provider::Local);
        let all: Vec<_> = linked.iter().collect();
        assert_eq!(all, vec![Provider::Local, Provider::Discord]);
        assert!(LinkedProviders::default().is_empty());
    }

    #[test]
    fn test_provider_round_trip_through_str() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>(), Ok(provider));
        }
        assert!("twitter".parse::<Provider>().is_err());
        assert!(!Provider::Github.requires_verified_email());
        assert!(Provider::Google.requires_verified_email());
    }
}
