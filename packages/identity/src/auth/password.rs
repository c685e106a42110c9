//! # Password hashing, verification and policy: Argon2id
//!
//! Used only by the local (email + password) provider:
//!
//! - [`hash_password`]: generates a random salt via [`OsRng`], hashes the plaintext
//!   with the default Argon2id parameters, and returns a PHC-format string
//!   (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`). That string is the identity's
//!   `password_hash` column.
//!
//! - [`verify_password`]: parses a stored PHC hash and checks the plaintext against
//!   it. The comparison inside `argon2` is constant-time. Returns `Ok(false)` on
//!   mismatch and `Err` only when the stored hash itself is malformed.
//!
//! - [`check_login_password`]: the login-side check. It runs exactly one Argon2
//!   verification whether or not a stored hash exists, using [`DUMMY_HASH`] when
//!   there is none, so an unknown email costs as much as a wrong password.
//!
//! - [`PasswordPolicy`]: length bounds applied at registration.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AuthError;

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("invalid stored password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Well-formed Argon2id hash that no password matches. Its parameters equal
/// `Argon2::default()`, so verifying against it costs the same as a real hash.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Check a login attempt against `stored`, paying for one Argon2 verification
/// in every case. A missing or malformed hash never matches.
pub fn check_login_password(password: &str, stored: Option<&str>) -> bool {
    let Some(hash) = stored else {
        let _ = verify_password(password, DUMMY_HASH);
        return false;
    };

    match verify_password(password, hash) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!("rejecting login against unusable hash: {}", e);
            let _ = verify_password(password, DUMMY_HASH);
            false
        }
    }
}

/// Length bounds for new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 5,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    pub fn check(&self, password: &str) -> Result<(), AuthError> {
        let len = password.chars().count();
        if len < self.min_length {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        if len > self.max_length {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at most {} characters",
                self.max_length
            )));
        }
        Ok(())
    }
}
