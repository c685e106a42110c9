//! # Discord profile fetch
//!
//! Reads `GET https://discord.com/api/users/@me`. Discord returns only an avatar
//! *hash*, so the avatar URL is built on its CDN:
//! `https://cdn.discordapp.com/avatars/{user_id}/{hash}.png`, or `.gif` for
//! animated avatars (hashes prefixed with `a_`). The `verified` flag is the
//! email-verification signal.

use serde::Deserialize;

use super::client::provider_error;
use super::OAuthProfile;
use crate::error::AuthError;

const PROFILE_URL: &str = "https://discord.com/api/users/@me";
const CDN_URL: &str = "https://cdn.discordapp.com";

/// Discord user info from API.
#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    global_name: Option<String>,
    email: Option<String>,
    verified: Option<bool>,
    avatar: Option<String>,
}

impl DiscordUser {
    fn into_profile(self) -> OAuthProfile {
        let avatar_url = self
            .avatar
            .as_deref()
            .map(|hash| avatar_url(&self.id, hash));
        OAuthProfile {
            display_name: self.global_name.or(Some(self.username)),
            email: self.email,
            email_verified: Some(self.verified.unwrap_or(false)),
            avatar_url,
            first_name: None,
            last_name: None,
            provider_user_id: self.id,
        }
    }
}

fn avatar_url(user_id: &str, hash: &str) -> String {
    let ext = if hash.starts_with("a_") { "gif" } else { "png" };
    format!("{CDN_URL}/avatars/{user_id}/{hash}.{ext}")
}

pub(super) async fn fetch_profile(
    http: &reqwest::Client,
    access_token: &str,
) -> Result<OAuthProfile, AuthError> {
    let user: DiscordUser = http
        .get(PROFILE_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(provider_error)?
        .json()
        .await
        .map_err(provider_error)?;

    Ok(user.into_profile())
}
