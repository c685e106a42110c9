//! # GitHub profile fetch
//!
//! Reads `GET https://api.github.com/user`. When the profile hides its email,
//! falls back to `/user/emails` and picks the primary verified address. GitHub
//! gives no verification flag on the profile itself, so `email_verified` stays
//! `None` and registration does not require it.

use serde::Deserialize;

use super::client::provider_error;
use super::OAuthProfile;
use crate::error::AuthError;

const PROFILE_URL: &str = "https://api.github.com/user";
const EMAILS_URL: &str = "https://api.github.com/user/emails";

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

/// GitHub email info from API.
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

impl GitHubUser {
    fn into_profile(self, email: Option<String>) -> OAuthProfile {
        OAuthProfile {
            provider_user_id: self.id.to_string(),
            email,
            email_verified: None,
            display_name: self.name.or(Some(self.login)),
            first_name: None,
            last_name: None,
            avatar_url: self.avatar_url,
        }
    }
}

fn primary_verified(emails: Vec<GitHubEmail>) -> Option<String> {
    emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
}

pub(super) async fn fetch_profile(
    http: &reqwest::Client,
    access_token: &str,
) -> Result<OAuthProfile, AuthError> {
    let github_user: GitHubUser = http
        .get(PROFILE_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(provider_error)?
        .json()
        .await
        .map_err(provider_error)?;

    // Get primary email if not in user info
    let email = match github_user.email.clone() {
        Some(email) => Some(email),
        None => {
            let emails: Vec<GitHubEmail> = http
                .get(EMAILS_URL)
                .bearer_auth(access_token)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(provider_error)?
                .json()
                .await
                .map_err(provider_error)?;
            primary_verified(emails)
        }
    };

    Ok(github_user.into_profile(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fields() {
        let user: GitHubUser = serde_json::from_str(
            r#"{"id":583231,"login":"octocat","email":null,"name":null,
                "avatar_url":"https://avatars.githubusercontent.com/u/583231?v=4"}"#,
        )
        .unwrap();
        let profile = user.into_profile(Some("octocat@github.com".to_string()));

        assert_eq!(profile.provider_user_id, "583231");
        assert_eq!(profile.display_name.as_deref(), Some("octocat"));
        assert_eq!(profile.email_verified, None);
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://avatars.githubusercontent.com/u/583231?v=4")
        );
    }

    #[test]
    fn test_primary_verified_email() {
        let emails: Vec<GitHubEmail> = serde_json::from_str(
            r#"[{"email":"old@x.com","primary":false,"verified":true},
                {"email":"main@x.com","primary":true,"verified":true}]"#,
        )
        .unwrap();
        assert_eq!(primary_verified(emails).as_deref(), Some("main@x.com"));

        let unverified: Vec<GitHubEmail> = serde_json::from_str(
            r#"[{"email":"main@x.com","primary":true,"verified":false}]"#,
        )
        .unwrap();
        assert_eq!(primary_verified(unverified), None);
    }
}
