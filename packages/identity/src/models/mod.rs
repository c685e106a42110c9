//! Data models for the identity subsystem.

mod identity;

pub use identity::{
    is_valid_email, normalize_email, Identity, IdentityInfo, LinkedProviders, NewIdentity,
    ProfileUpdate, Provider, UnknownProvider,
};
