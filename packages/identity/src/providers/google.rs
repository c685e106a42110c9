//! Google profile fetch from the userinfo endpoint.

use serde::Deserialize;

use super::client::provider_error;
use super::OAuthProfile;
use crate::error::AuthError;

const PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google user info from API.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: Option<String>,
    verified_email: Option<bool>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

impl GoogleUser {
    fn into_profile(self) -> OAuthProfile {
        OAuthProfile {
            provider_user_id: self.id,
            email: self.email,
            email_verified: Some(self.verified_email.unwrap_or(false)),
            display_name: self.name,
            first_name: self.given_name,
            last_name: self.family_name,
            avatar_url: self.picture,
        }
    }
}

pub(super) async fn fetch_profile(
    http: &reqwest::Client,
    access_token: &str,
) -> Result<OAuthProfile, AuthError> {
    let google_user: GoogleUser = http
        .get(PROFILE_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(provider_error)?
        .json()
        .await
        .map_err(provider_error)?;

    Ok(google_user.into_profile())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fields() {
        let user: GoogleUser = serde_json::from_str(
            r#"{"id":"1090","email":"a@gmail.com","verified_email":true,"name":"Ada Lovelace",
                "given_name":"Ada","family_name":"Lovelace","picture":"https://lh3.googleusercontent.com/a/x"}"#,
        )
        .unwrap();
        let profile = user.into_profile();

        assert_eq!(profile.email.as_deref(), Some("a@gmail.com"));
        assert_eq!(profile.email_verified, Some(true));
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(profile.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://lh3.googleusercontent.com/a/x")
        );
    }

    #[test]
    fn test_missing_verification_counts_as_unverified() {
        let user: GoogleUser = serde_json::from_str(r#"{"id":"1","email":"a@gmail.com"}"#).unwrap();
        assert_eq!(user.into_profile().email_verified, Some(false));
    }
}
