//! Authentication: credential verifiers, session codec and the route gate.

mod gate;
mod local;
mod oauth;
mod password;
mod session;

pub use gate::{route_gate, CurrentIdentity, RouteGate, Whitelist};
pub use local::{LocalLogin, LocalRegistration, LocalVerifier};
pub use oauth::OAuthVerifier;
pub use password::{hash_password, verify_password, PasswordPolicy};
pub use session::{SessionCodec, DEFAULT_SESSION_TTL, SESSION_IDENTITY_KEY};
